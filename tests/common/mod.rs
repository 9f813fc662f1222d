#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path as UrlPath, State},
    http::{Response, StatusCode, header::CONTENT_TYPE},
    routing::get,
    serve,
};
use tokio::net::TcpListener;
use url::Url;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

type Files = Arc<HashMap<String, Vec<u8>>>;

/// In-process HTTP server answering `/files/<name>` from a fixed table, 404 otherwise.
pub struct TestHttpServer {
    base: Url,
}

impl TestHttpServer {
    pub async fn spawn(files: &[(&str, &[u8])]) -> Self {
        let files: Files = Arc::new(
            files
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_vec()))
                .collect(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = Url::parse(&format!("http://{addr}/files/")).unwrap();

        let router = Router::new()
            .route("/files/{*name}", get(serve_file))
            .with_state(files);

        tokio::spawn(async move {
            let _ = serve(listener, router).await;
        });

        Self { base }
    }

    pub fn url(&self, name: &str) -> Url {
        self.base.join(name).unwrap()
    }
}

async fn serve_file(State(files): State<Files>, UrlPath(name): UrlPath<String>) -> Response<Body> {
    match files.get(&name) {
        Some(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(body.clone()))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .unwrap(),
    }
}

/// Write a zip at `path` holding the given entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Sorted entry names of the zip at `path`.
pub fn zip_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

pub fn read_entry(path: &Path, name: &str) -> Vec<u8> {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    data
}
