// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `http_server.rs`

#[cfg(test)]
mod tests {
    use crate::http_server::{router, Readiness};
    use crate::metrics;
    use std::time::Duration;

    async fn spawn_server(readiness: Readiness) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(readiness)).await.unwrap();
        });
        format!("http://{address}")
    }

    #[tokio::test]
    async fn test_healthz() {
        let base = spawn_server(Readiness::default()).await;
        let response = reqwest::get(format!("{base}/healthz")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_readyz_follows_flag() {
        let readiness = Readiness::default();
        let base = spawn_server(readiness.clone()).await;

        let response = reqwest::get(format!("{base}/readyz")).await.unwrap();
        assert_eq!(response.status().as_u16(), 503);

        readiness.set_ready(true);
        let response = reqwest::get(format!("{base}/readyz")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_metrics_exposes_operator_prefix() {
        metrics::record_reconciliation_success("CoreProvider", Duration::from_millis(10));
        let base = spawn_server(Readiness::default()).await;

        let body = reqwest::get(format!("{base}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("capi_operator_reconciliations_total"));
    }
}
