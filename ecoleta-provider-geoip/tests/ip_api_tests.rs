use std::thread::{self, JoinHandle};

use ecoleta_core::{Coordinate, GeolocationPort, PortError};
use ecoleta_provider_geoip::IpApiGeolocator;
use pretty_assertions::assert_eq;
use reqwest::Client;
use tiny_http::{Header, Response, Server};

fn serve_once(body: &'static str) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start mock server");
    let url = format!("http://{}/json", server.server_addr());
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert!(request.url().starts_with("/json?fields="));
        let response = Response::from_string(body).with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        );
        request.respond(response).expect("response should succeed");
    });
    (url, handle)
}

#[tokio::test]
async fn successful_lookup_yields_coordinate() {
    let (url, handle) = serve_once(r#"{"status":"success","lat":-23.5505,"lon":-46.6333}"#);

    let position = IpApiGeolocator::with_url(client(), url)
        .locate()
        .await
        .expect("lookup should succeed");

    assert_eq!(position, Coordinate::new(-23.5505, -46.6333));
    handle.join().expect("server thread should join");
}

#[tokio::test]
async fn failed_lookup_carries_the_reason() {
    let (url, handle) = serve_once(r#"{"status":"fail","message":"private range"}"#);

    let err = IpApiGeolocator::with_url(client(), url)
        .locate()
        .await
        .expect_err("lookup should fail");

    match err {
        PortError::Geolocation(reason) => assert_eq!(reason, "private range"),
        other => panic!("unexpected error {other:?}"),
    }
    handle.join().expect("server thread should join");
}

fn client() -> Client {
    Client::builder()
        .no_proxy()
        .build()
        .expect("client should build")
}
