//! Timeout resource safety: a never-responding endpoint must surface
//! `TransportError::Timeout` near the configured bound, and the bridge
//! must remain usable afterwards.

use crosswire_core::{Bridge, Courier, RequestDescriptor, TimeoutPolicy, TransportError};
use httpmock::{Method::GET, MockServer};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn enabled_bridges() -> Vec<Arc<dyn Bridge>> {
    let mut bridges: Vec<Arc<dyn Bridge>> = Vec::new();
    #[cfg(feature = "reqwest")]
    bridges.push(Arc::new(crosswire_bridges::ReqwestBridge::new().unwrap()));
    #[cfg(feature = "ureq")]
    bridges.push(Arc::new(crosswire_bridges::UreqBridge::new()));
    #[cfg(feature = "hyper")]
    bridges.push(Arc::new(crosswire_bridges::HyperBridge::new()));
    bridges
}

const TOTAL: Duration = Duration::from_millis(300);

#[tokio::test]
async fn timeout_fires_near_the_bound_and_bridge_survives() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200).delay(Duration::from_secs(10)).body("late");
    });
    server.mock(|when, then| {
        when.method(GET).path("/fast");
        then.status(200).body("quick");
    });

    for bridge in enabled_bridges() {
        let name = bridge.name();
        let courier = Courier::new(bridge);

        let request = RequestDescriptor::get(server.url("/slow"))
            .timeout(TimeoutPolicy::new(Duration::from_millis(100), TOTAL).unwrap())
            .build()
            .unwrap();
        let started = Instant::now();
        let err = courier.send(request).await.unwrap_err();
        let waited = started.elapsed();

        assert!(matches!(err, TransportError::Timeout(_)), "bridge {name}: got {err}");
        // Transports may race the facade's timer by a few milliseconds.
        assert!(
            waited >= TOTAL - Duration::from_millis(50),
            "bridge {name} returned before the bound ({waited:?})"
        );
        assert!(waited < TOTAL + Duration::from_secs(2), "bridge {name} overshot ({waited:?})");

        // Same bridge, next request: resources were released.
        let request = RequestDescriptor::get(server.url("/fast")).build().unwrap();
        let response = courier.send(request).await.unwrap();
        assert_eq!(response.body_text().await.unwrap(), "quick", "bridge {name}");
    }
}
