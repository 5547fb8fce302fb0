//! Sequential endpoint failover
//!
//! One GET/validate/parse cycle per candidate, strictly in resolver order.
//! The first credential that parses is returned and later candidates are
//! never contacted. Every failure is recorded against its endpoint and the
//! loop moves on; only when the list is exhausted does the caller see an
//! error, and that error carries every per-endpoint reason in order.
//!
//! No retries, backoff, or state carried between calls.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::endpoint::{Endpoint, EndpointResolver};
use crate::error::{EndpointError, Error, Result};
use crate::record::CredentialRecord;
use crate::transport::Transport;
use crate::validate::validate;

/// Acquires anisette data from the first healthy provider.
///
/// Construct one per process (or per caller) and pass it by reference.
#[derive(Clone)]
pub struct AnisetteFetcher {
    resolver: EndpointResolver,
    transport: Arc<dyn Transport>,
}

impl AnisetteFetcher {
    pub fn new(resolver: EndpointResolver, transport: Arc<dyn Transport>) -> Self {
        Self {
            resolver,
            transport,
        }
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Resolve the candidate list and walk it until one succeeds.
    pub async fn fetch(&self) -> Result<CredentialRecord> {
        let endpoints = self.resolver.resolve();
        self.fetch_from(&endpoints).await
    }

    /// Walk an explicit candidate list.
    pub async fn fetch_from(&self, endpoints: &[Endpoint]) -> Result<CredentialRecord> {
        if endpoints.is_empty() {
            return Err(Error::NoEndpointsConfigured);
        }

        let mut failures = Vec::with_capacity(endpoints.len());

        for endpoint in endpoints {
            info!(endpoint = %endpoint, "trying anisette endpoint");
            match self.attempt(endpoint).await {
                Ok(record) => {
                    crate::metrics::record_attempt("success");
                    info!(
                        endpoint = %endpoint,
                        failed_before = failures.len(),
                        "acquired anisette data"
                    );
                    debug!(record = ?record, "anisette record");
                    return Ok(record);
                }
                Err(e) => {
                    crate::metrics::record_attempt(e.kind());
                    let failure = EndpointError::new(endpoint.clone(), &e);
                    warn!(endpoint = %endpoint, kind = e.kind(), error = %e, "{failure}");
                    failures.push(failure);
                }
            }
        }

        crate::metrics::record_fetch_failure();
        let err = Error::AllEndpointsFailed(failures);
        error!(attempted = endpoints.len(), "{err}");
        Err(err)
    }

    async fn attempt(&self, endpoint: &Endpoint) -> Result<CredentialRecord> {
        let response = self.transport.get(endpoint).await?;
        let document = validate(
            response.status,
            response.content_type.as_deref(),
            &response.body,
        )?;
        CredentialRecord::from_document(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointOverrides;
    use crate::transport::RawResponse;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    fn anisette_json() -> serde_json::Value {
        serde_json::json!({
            "X-Apple-I-MD-M": "mid",
            "X-Apple-I-MD": "otp",
            "X-Apple-I-MD-LU": "lu",
            "X-Apple-I-MD-RINFO": "17106176",
            "X-Mme-Device-Id": "device-uuid",
            "X-Apple-I-SRL-NO": "0",
            "X-MMe-Client-Info": "<iMac20,2> <Mac OS X;13.1;22C65> <com.apple.AuthKit/1 (com.apple.dt.Xcode/3594.4.19)>",
            "X-Apple-I-Client-Time": "2024-01-02T03:04:05Z",
            "X-Apple-Locale": "en_US",
            "X-Apple-I-TimeZone": "PST"
        })
    }

    fn ok_json(value: &serde_json::Value) -> Result<RawResponse> {
        Ok(RawResponse {
            status: 200,
            content_type: Some("application/json".into()),
            body: value.to_string().into_bytes(),
        })
    }

    /// Transport that answers from a per-URL script and logs every call.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: HashMap<String, fn() -> Result<RawResponse>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn with(mut self, url: &str, response: fn() -> Result<RawResponse>) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn get<'a>(
            &'a self,
            endpoint: &'a Endpoint,
        ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>> {
            self.calls.lock().unwrap().push(endpoint.to_string());
            let response = match self.responses.get(endpoint.as_str()) {
                Some(respond) => respond(),
                None => Err(Error::Transport("connection refused".into())),
            };
            Box::pin(async move { response })
        }
    }

    fn fetcher_for(servers: &str, transport: Arc<ScriptedTransport>) -> AnisetteFetcher {
        let resolver = EndpointResolver::new(EndpointOverrides {
            servers: Some(servers.into()),
            server: None,
        });
        AnisetteFetcher::new(resolver, transport)
    }

    #[tokio::test]
    async fn first_success_stops_the_walk() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .with("http://one", || ok_json(&anisette_json()))
                .with("http://two", || ok_json(&anisette_json()))
                .with("http://three", || ok_json(&anisette_json())),
        );
        let fetcher = fetcher_for("http://one,http://two,http://three", transport.clone());

        let record = fetcher.fetch().await.unwrap();

        assert_eq!(record.one_time_password(), "otp");
        assert_eq!(transport.calls(), vec!["http://one"]);
    }

    #[tokio::test]
    async fn falls_through_to_later_success() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .with("http://two", || {
                    Ok(RawResponse {
                        status: 503,
                        content_type: Some("text/plain".into()),
                        body: b"Service Unavailable".to_vec(),
                    })
                })
                .with("http://three", || ok_json(&anisette_json())),
        );
        let fetcher = fetcher_for("http://one;http://two;http://three", transport.clone());

        let record = fetcher.fetch().await.unwrap();

        assert_eq!(record.time_zone(), "PST");
        assert_eq!(
            transport.calls(),
            vec!["http://one", "http://two", "http://three"]
        );
    }

    #[tokio::test]
    async fn all_failures_are_aggregated_in_order() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .with("http://html", || {
                    Ok(RawResponse {
                        status: 200,
                        content_type: Some("text/html".into()),
                        body: b"<html>maintenance</html>".to_vec(),
                    })
                })
                .with("http://unavailable", || {
                    Ok(RawResponse {
                        status: 503,
                        content_type: None,
                        body: b"Service Unavailable".to_vec(),
                    })
                })
                .with("http://no-locale", || {
                    let mut doc = anisette_json();
                    doc.as_object_mut().unwrap().remove("X-Apple-Locale");
                    ok_json(&doc)
                }),
        );
        let fetcher = fetcher_for(
            "http://refused http://html http://unavailable http://no-locale",
            transport.clone(),
        );

        let err = fetcher.fetch().await.unwrap_err();

        let Error::AllEndpointsFailed(failures) = &err else {
            panic!("expected AllEndpointsFailed, got {err:?}");
        };
        let endpoints: Vec<&str> = failures.iter().map(|f| f.endpoint().as_str()).collect();
        assert_eq!(
            endpoints,
            vec![
                "http://refused",
                "http://html",
                "http://unavailable",
                "http://no-locale"
            ]
        );
        let kinds: Vec<&str> = failures.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["transport", "parse", "http_status", "parse"]);
        assert!(failures[2].message().contains("503"));
        assert!(failures[2].message().contains("Service Unavailable"));
        assert!(failures[3].message().contains("X-Apple-Locale"));

        let rendered = err.to_string();
        assert!(rendered.starts_with("all anisette endpoints failed\n- "));
        assert_eq!(rendered.lines().count(), 5, "got:\n{rendered}");
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn empty_candidate_list_is_rejected() {
        let fetcher = fetcher_for("http://unused", Arc::new(ScriptedTransport::default()));
        let err = fetcher.fetch_from(&[]).await.unwrap_err();
        assert!(matches!(err, Error::NoEndpointsConfigured), "got {err:?}");
    }

    #[tokio::test]
    async fn each_call_starts_fresh() {
        let transport = Arc::new(ScriptedTransport::default().with("http://b", || {
            ok_json(&anisette_json())
        }));
        let fetcher = fetcher_for("http://a,http://b", transport.clone());

        fetcher.fetch().await.unwrap();
        fetcher.fetch().await.unwrap();

        assert_eq!(
            transport.calls(),
            vec!["http://a", "http://b", "http://a", "http://b"]
        );
    }

    #[tokio::test]
    async fn default_candidates_are_walked_in_resolver_order() {
        let transport = Arc::new(ScriptedTransport::default());
        let resolver = EndpointResolver::new(EndpointOverrides {
            servers: None,
            server: Some("http://custom:9".into()),
        });
        let fetcher = AnisetteFetcher::new(resolver, transport.clone());

        let err = fetcher.fetch().await.unwrap_err();

        assert!(matches!(err, Error::AllEndpointsFailed(ref f) if f.len() == 3));
        assert_eq!(
            transport.calls(),
            vec![
                "http://custom:9",
                "http://127.0.0.1:6969",
                "http://localhost:6969"
            ]
        );
    }

    #[tokio::test]
    async fn attempts_are_counted_by_outcome() {
        let (recorder, handle) = crate::metrics::tests::isolated_recorder();
        let transport = Arc::new(ScriptedTransport::default().with("http://ok", || {
            ok_json(&anisette_json())
        }));
        let fetcher = fetcher_for("http://down,http://ok", transport);

        // Local recorder guards are thread-local; the current-thread test
        // runtime keeps the whole fetch on this thread.
        let _guard = metrics::set_default_local_recorder(&recorder);
        fetcher.fetch().await.unwrap();

        let output = handle.render();
        assert!(
            output.contains("anisette_endpoint_attempts_total{outcome=\"transport\"} 1"),
            "got:\n{output}"
        );
        assert!(
            output.contains("anisette_endpoint_attempts_total{outcome=\"success\"} 1"),
            "got:\n{output}"
        );
    }

    /// End-to-end over real sockets: a dead port, a 503 provider, then a
    /// healthy provider.
    #[tokio::test]
    async fn fails_over_across_real_http_providers() {
        use crate::transport::HttpTransport;
        use axum::Router;
        use axum::routing::get;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tokio::net::TcpListener;

        async fn serve(app: Router) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{addr}")
        }

        let unavailable = serve(Router::new().route(
            "/",
            get(|| async {
                (
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                )
            }),
        ))
        .await;

        let healthy_hits = Arc::new(AtomicUsize::new(0));
        let hits = healthy_hits.clone();
        let healthy = serve(Router::new().route(
            "/",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    axum::Json(anisette_json())
                }
            }),
        ))
        .await;

        let resolver = EndpointResolver::new(EndpointOverrides {
            servers: Some(format!("http://127.0.0.1:1,{unavailable},{healthy}")),
            server: None,
        });
        let fetcher = AnisetteFetcher::new(resolver, Arc::new(HttpTransport::default()));

        let record = fetcher.fetch().await.unwrap();

        assert_eq!(record.device_unique_id(), "device-uuid");
        assert_eq!(healthy_hits.load(Ordering::SeqCst), 1);
    }
}
