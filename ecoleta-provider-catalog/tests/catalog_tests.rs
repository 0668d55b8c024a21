use std::thread::{self, JoinHandle};

use ecoleta_core::{CatalogPort, Category, CategoryId, PortError};
use ecoleta_provider_catalog::HttpCatalogPort;
use pretty_assertions::assert_eq;
use reqwest::Client;
use tiny_http::{Header, Response, Server};

fn serve_once(url: &'static str, status: u16, body: &'static str) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start mock server");
    let base = format!("http://{}", server.server_addr());
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), url);
        let response = Response::from_string(body)
            .with_status_code(status)
            .with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            );
        request.respond(response).expect("response should succeed");
    });
    (base, handle)
}

#[tokio::test]
async fn items_keep_server_order() {
    let (base, handle) = serve_once(
        "/items",
        200,
        r#"[
            {"id":2,"name":"Pilhas e Baterias","image_url":"http://localhost:3333/uploads/baterias.svg"},
            {"id":1,"name":"Lâmpadas","image_url":"http://localhost:3333/uploads/lampadas.svg"}
        ]"#,
    );

    let port = HttpCatalogPort::new(client(), base);
    let items = port.items().await.expect("items should load");

    assert_eq!(
        items,
        vec![
            Category {
                id: CategoryId(2),
                name: "Pilhas e Baterias".to_owned(),
                icon_url: "http://localhost:3333/uploads/baterias.svg".to_owned(),
            },
            Category {
                id: CategoryId(1),
                name: "Lâmpadas".to_owned(),
                icon_url: "http://localhost:3333/uploads/lampadas.svg".to_owned(),
            },
        ]
    );
    handle.join().expect("server thread should join");
}

#[tokio::test]
async fn undecodable_body_is_a_permanent_failure() {
    let (base, handle) = serve_once("/items", 200, r#"{"items":[]}"#);

    let port = HttpCatalogPort::new(client(), format!("{base}/"));
    let err = port.items().await.expect_err("object body should not decode");

    assert!(matches!(err, PortError::Network(_)));
    assert!(!err.is_transient());
    handle.join().expect("server thread should join");
}

#[tokio::test]
async fn missing_catalog_is_not_retried() {
    let (base, handle) = serve_once("/items", 404, "[]");

    let port = HttpCatalogPort::new(client(), base);
    let err = port.items().await.expect_err("404 should fail");

    assert!(!err.is_transient());
    handle.join().expect("server thread should join");
}

fn client() -> Client {
    Client::builder()
        .no_proxy()
        .build()
        .expect("client should build")
}
