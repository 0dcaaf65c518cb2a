// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Endpoint call metrics and a tracked HTTP client.
//!
//! Every call records a duration and a request count; failed calls also
//! bump an error counter. [`TrackedClient`] wraps `reqwest` so callers get
//! all of this for free, including transport failures that never produced
//! a response.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::navigation::RouteSwitchTracker;
use crate::sink::{CounterHandle, HistogramHandle, InstrumentSpec, SharedSink};
use crate::types::{attr, Attributes};

/// Histogram of endpoint call durations.
pub const ENDPOINT_DURATION_INSTRUMENT: &str = "frontend.endpoint.duration_milliseconds";

/// Counter of all endpoint calls.
pub const ENDPOINT_REQUESTS_INSTRUMENT: &str = "frontend.endpoint.requests_total";

/// Counter of failed endpoint calls.
pub const ENDPOINT_ERRORS_INSTRUMENT: &str = "frontend.endpoint.errors_total";

/// Description of one finished endpoint call.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointCall {
    /// Request path, as the caller addressed it.
    pub endpoint: String,

    /// HTTP method.
    pub method: String,

    /// Response status, when a response arrived at all.
    pub status_code: Option<u16>,

    /// Whether the call counts as successful.
    pub success: bool,

    /// Route the call was made from. Falls back to the tracker's current
    /// route when unset.
    pub route: Option<String>,
}

impl EndpointCall {
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            status_code: None,
            success: false,
            route: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }
}

struct EndpointInner {
    duration: Option<Arc<dyn HistogramHandle>>,
    requests: Option<Arc<dyn CounterHandle>>,
    errors: Option<Arc<dyn CounterHandle>>,
    navigation: RouteSwitchTracker,
    service_name: String,
    log_measurements: bool,
}

/// Records endpoint call measurements.
///
/// Cheap to clone; clones share instruments.
#[derive(Clone)]
pub struct EndpointMetrics {
    inner: Arc<EndpointInner>,
}

impl EndpointMetrics {
    /// Create the three endpoint instruments on the sink.
    pub fn new(
        sink: &SharedSink,
        navigation: RouteSwitchTracker,
        service_name: impl Into<String>,
        log_measurements: bool,
    ) -> Self {
        let duration = match sink.create_histogram(
            InstrumentSpec::new(
                ENDPOINT_DURATION_INSTRUMENT,
                "Duration of endpoint calls in milliseconds",
            )
            .with_unit("ms"),
        ) {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%error, "failed to create endpoint duration instrument");
                None
            }
        };
        let requests = match sink.create_counter(InstrumentSpec::new(
            ENDPOINT_REQUESTS_INSTRUMENT,
            "Total number of endpoint calls",
        )) {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%error, "failed to create endpoint request counter");
                None
            }
        };
        let errors = match sink.create_counter(InstrumentSpec::new(
            ENDPOINT_ERRORS_INSTRUMENT,
            "Total number of failed endpoint calls",
        )) {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%error, "failed to create endpoint error counter");
                None
            }
        };

        Self {
            inner: Arc::new(EndpointInner {
                duration,
                requests,
                errors,
                navigation,
                service_name: service_name.into(),
                log_measurements,
            }),
        }
    }

    /// Record one finished call.
    ///
    /// All three instruments must exist; otherwise the call is dropped
    /// with a warning so a partial instrument set never skews ratios
    /// between the counters.
    pub fn record(&self, duration: Duration, call: &EndpointCall) {
        let inner = &self.inner;
        let (Some(duration_histogram), Some(requests), Some(errors)) =
            (&inner.duration, &inner.requests, &inner.errors)
        else {
            warn!(endpoint = %call.endpoint, "endpoint instruments incomplete, dropping measurement");
            return;
        };

        let attributes = self.call_attributes(call);
        let millis = duration.as_secs_f64() * 1000.0;

        if let Err(error) = duration_histogram.record(millis, &attributes) {
            warn!(endpoint = %call.endpoint, %error, "failed to record endpoint duration");
        }
        if let Err(error) = requests.add(1, &attributes) {
            warn!(endpoint = %call.endpoint, %error, "failed to count endpoint request");
        }
        if !call.success {
            if let Err(error) = errors.add(1, &attributes) {
                warn!(endpoint = %call.endpoint, %error, "failed to count endpoint error");
            }
        }

        if inner.log_measurements {
            info!(
                endpoint = %call.endpoint,
                method = %call.method,
                duration_ms = millis,
                success = call.success,
                "recorded endpoint call"
            );
        }
    }

    fn call_attributes(&self, call: &EndpointCall) -> Attributes {
        let route = call
            .route
            .clone()
            .or_else(|| self.inner.navigation.current_route())
            .unwrap_or_else(|| "unknown".to_string());

        let mut attributes = Attributes::new()
            .with(attr::SERVICE_NAME, self.inner.service_name.as_str())
            .with(attr::HTTP_ENDPOINT, call.endpoint.as_str())
            .with(attr::HTTP_METHOD, call.method.as_str())
            .with(attr::HTTP_ROUTE, route)
            .with(attr::REQUEST_SUCCESS, call.success);
        if let Some(status) = call.status_code {
            attributes.insert(attr::HTTP_STATUS_CODE, status);
            attributes.insert(attr::HTTP_STATUS_CLASS, status_class(status));
        }
        attributes
    }
}

impl std::fmt::Debug for EndpointMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointMetrics")
            .field("service_name", &self.inner.service_name)
            .finish()
    }
}

/// Status class in `2xx` form.
fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

/// Path component of a URL, or the input unchanged when it is already a
/// bare path.
fn endpoint_label(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}

/// An HTTP client that records endpoint metrics for every request.
#[derive(Debug, Clone)]
pub struct TrackedClient {
    client: reqwest::Client,
    metrics: EndpointMetrics,
}

impl TrackedClient {
    pub fn new(metrics: EndpointMetrics) -> Self {
        Self::with_client(reqwest::Client::new(), metrics)
    }

    pub fn with_client(client: reqwest::Client, metrics: EndpointMetrics) -> Self {
        Self { client, metrics }
    }

    /// Send a GET request, recording its metrics.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.execute(reqwest::Method::GET, url).await
    }

    /// Send a request, recording its metrics.
    ///
    /// The active route is captured before the request is sent, so a
    /// navigation during the call cannot misattribute it. Transport
    /// errors are recorded as failed calls without a status and then
    /// propagated to the caller.
    pub async fn execute(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let endpoint = endpoint_label(url);
        let route = self.metrics.inner.navigation.current_route();
        let started = std::time::Instant::now();

        let result = self.client.request(method.clone(), url).send().await;
        let elapsed = started.elapsed();

        let mut call = EndpointCall::new(endpoint, method.as_str());
        if let Some(route) = route {
            call = call.with_route(route);
        }
        match &result {
            Ok(response) => {
                let status = response.status();
                call = call
                    .with_status(status.as_u16())
                    .with_success(status.is_success());
            }
            Err(_) => {
                call = call.with_success(false);
            }
        }

        self.metrics.record(elapsed, &call);
        result
    }
}
