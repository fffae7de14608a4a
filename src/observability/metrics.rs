use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub cart_mutations_total: IntCounterVec,
    pub dispatch_requests_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub assignment_transitions_total: IntCounterVec,
    pub active_deliveries: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let cart_mutations_total = IntCounterVec::new(
            Opts::new("cart_mutations_total", "Cart mutations by outcome"),
            &["outcome"],
        )
        .expect("valid cart_mutations_total metric");

        let dispatch_requests_total = IntCounterVec::new(
            Opts::new("dispatch_requests_total", "Dispatch requests by outcome"),
            &["outcome"],
        )
        .expect("valid dispatch_requests_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of order dispatch in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let assignment_transitions_total = IntCounterVec::new(
            Opts::new(
                "assignment_transitions_total",
                "Assignment status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid assignment_transitions_total metric");

        let active_deliveries = IntGauge::new(
            "active_deliveries",
            "Assignments currently accepted or picked",
        )
        .expect("valid active_deliveries metric");

        registry
            .register(Box::new(cart_mutations_total.clone()))
            .expect("register cart_mutations_total");
        registry
            .register(Box::new(dispatch_requests_total.clone()))
            .expect("register dispatch_requests_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(assignment_transitions_total.clone()))
            .expect("register assignment_transitions_total");
        registry
            .register(Box::new(active_deliveries.clone()))
            .expect("register active_deliveries");

        Self {
            registry,
            cart_mutations_total,
            dispatch_requests_total,
            dispatch_latency_seconds,
            assignment_transitions_total,
            active_deliveries,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
