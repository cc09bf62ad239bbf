//! Liveness checks for extension sources
//!
//! Every probe is independent: failures collapse to an unreachable result for
//! that source only, and no probe waits on another.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use futures::future::join_all;
use futures::stream::FuturesUnordered;
use tracing::{debug, info};

use crate::catalog::types::Extension;
use crate::config::ProbeConfig;
use crate::probe::board::{ProbeBoard, ProbeKey, SlotState};
use crate::probe::prober::{DirectProber, ProbeResult, Prober, ProxyProber};

pub struct LivenessChecker {
    prober: Arc<dyn Prober>,
}

impl LivenessChecker {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Use the configured proxy service, or probe directly when none is set
    pub fn from_config(config: &ProbeConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        let prober: Arc<dyn Prober> = match config.proxy_url.as_deref() {
            Some(proxy) if !proxy.trim().is_empty() => {
                info!("Probing through proxy service {}", proxy);
                Arc::new(ProxyProber::new(proxy, timeout))
            }
            _ => Arc::new(DirectProber::new(timeout)),
        };
        Self::new(prober)
    }

    /// Probe one URL; never fails
    ///
    /// An empty URL is unreachable without any network call.
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let url = url.trim();
        if url.is_empty() {
            return ProbeResult::dead(None);
        }

        match self.prober.check(url).await {
            Ok(result) => result,
            Err(e) => {
                debug!("Probe of {} failed: {}", url, e);
                ProbeResult::dead(None)
            }
        }
    }

    /// Probe every source of an extension concurrently; results follow source order
    pub async fn probe_sources(&self, ext: &Extension) -> Vec<ProbeResult> {
        join_all(ext.sources.iter().map(|source| self.probe(&source.base_url))).await
    }

    /// Probe every source of an extension, writing each result into `board` as it lands
    ///
    /// Results are written under the generation current when the batch started;
    /// if the view moves the board on meanwhile they are dropped. Returns the
    /// number of results written.
    pub async fn check_into(&self, ext: &Extension, board: &Mutex<ProbeBoard>) -> usize {
        let generation = board
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .begin((0..ext.sources.len()).map(|i| ProbeKey::new(&ext.pkg, i)));

        let mut in_flight: FuturesUnordered<_> = ext
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| async move {
                let result = self.probe(&source.base_url).await;
                (ProbeKey::new(&ext.pkg, i), result)
            })
            .collect();

        let mut written = 0;
        while let Some((key, result)) = in_flight.next().await {
            let mut slots = board.lock().unwrap_or_else(PoisonError::into_inner);
            if slots.complete(generation, &key, result) {
                written += 1;
            }
        }

        debug!(
            "Probed {} sources of {}, {} results kept",
            ext.sources.len(),
            ext.pkg,
            written
        );
        written
    }
}

/// Status text for one source: waiting, scanning, `No URL` or the result badge
pub fn slot_label(url: &str, slot: Option<SlotState>) -> String {
    if url.trim().is_empty() {
        return "No URL".to_string();
    }
    match slot {
        None => "Đang chờ...".to_string(),
        Some(SlotState::Pending) => "Đang quét...".to_string(),
        Some(SlotState::Done(result)) => result.label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::aggregator::Catalog;
    use crate::catalog::session::Session;
    use crate::catalog::types::Source;
    use crate::probe::error::ProbeError;
    use crate::probe::prober::MockProber;
    use rstest::rstest;

    fn ext_with_urls(urls: &[&str]) -> Extension {
        Extension {
            pkg: "x".to_string(),
            sources: urls
                .iter()
                .enumerate()
                .map(|(i, url)| Source {
                    id: i.to_string(),
                    name: format!("Source {i}"),
                    base_url: url.to_string(),
                    lang: "vi".to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn probe_short_circuits_empty_url(#[case] url: &str) {
        let mut prober = MockProber::new();
        prober.expect_check().times(0);
        let checker = LivenessChecker::new(Arc::new(prober));

        let result = checker.probe(url).await;

        assert_eq!(result, ProbeResult { live: false, status: None });
    }

    #[tokio::test]
    async fn probe_surfaces_prober_verdict() {
        let mut prober = MockProber::new();
        prober
            .expect_check()
            .withf(|url| url == "https://a.example")
            .times(1)
            .returning(|_| Ok(ProbeResult::dead(Some(521))));
        let checker = LivenessChecker::new(Arc::new(prober));

        let result = checker.probe("https://a.example").await;

        assert_eq!(result, ProbeResult::dead(Some(521)));
    }

    #[tokio::test]
    async fn probe_collapses_errors_to_unreachable() {
        let mut prober = MockProber::new();
        prober
            .expect_check()
            .times(1)
            .returning(|_| Err(ProbeError::Status(502)));
        let checker = LivenessChecker::new(Arc::new(prober));

        let result = checker.probe("https://a.example").await;

        assert_eq!(result, ProbeResult::dead(None));
    }

    #[tokio::test]
    async fn probe_sources_isolates_failures_and_keeps_order() {
        let mut prober = MockProber::new();
        prober.expect_check().returning(|url| match url {
            "https://up.example" => Ok(ProbeResult::live(200)),
            "https://down.example" => Err(ProbeError::InvalidResponse("boom".to_string())),
            _ => Ok(ProbeResult::dead(Some(404))),
        });
        let checker = LivenessChecker::new(Arc::new(prober));
        let ext = ext_with_urls(&[
            "https://down.example",
            "",
            "https://up.example",
            "https://gone.example",
        ]);

        let results = checker.probe_sources(&ext).await;

        assert_eq!(
            results,
            vec![
                ProbeResult::dead(None),
                ProbeResult::dead(None),
                ProbeResult::live(200),
                ProbeResult::dead(Some(404)),
            ]
        );
    }

    #[tokio::test]
    async fn check_into_fills_board_slots() {
        let mut prober = MockProber::new();
        prober
            .expect_check()
            .returning(|_| Ok(ProbeResult::live(200)));
        let checker = LivenessChecker::new(Arc::new(prober));
        let ext = ext_with_urls(&["https://a.example", "https://b.example"]);
        let board = Mutex::new(ProbeBoard::new());

        let written = checker.check_into(&ext, &board).await;

        assert_eq!(written, 2);
        let board = board.into_inner().unwrap();
        assert_eq!(board.pending_count(), 0);
        assert_eq!(
            board.get(&ProbeKey::new("x", 1)),
            Some(SlotState::Done(ProbeResult::live(200)))
        );
    }

    #[tokio::test]
    async fn check_into_drops_results_after_view_change() {
        let ext = ext_with_urls(&["https://a.example", "https://trigger.example"]);
        let mut session = Session::new();
        session.set_catalog(Catalog::new(vec![ext.clone()], vec![]));
        let board = session.probe_board();
        let session = Arc::new(Mutex::new(session));

        let mut prober = MockProber::new();
        let handle = Arc::clone(&session);
        prober.expect_check().returning(move |url| {
            if url.contains("trigger") {
                handle.lock().unwrap().set_query_text("changed view");
            }
            Ok(ProbeResult::live(200))
        });
        let checker = LivenessChecker::new(Arc::new(prober));

        checker.check_into(&ext, &board).await;

        let board = board.lock().unwrap();
        assert_eq!(board.generation(), session.lock().unwrap().generation());
        assert_eq!(board.get(&ProbeKey::new("x", 0)), None);
        assert_eq!(board.get(&ProbeKey::new("x", 1)), None);
    }

    #[rstest]
    #[case("", None, "No URL")]
    #[case("https://a.example", None, "Đang chờ...")]
    #[case("https://a.example", Some(SlotState::Pending), "Đang quét...")]
    #[case("https://a.example", Some(SlotState::Done(ProbeResult::live(200))), "LIVE")]
    #[case("https://a.example", Some(SlotState::Done(ProbeResult::dead(Some(521)))), "DIE (521)")]
    fn slot_label_renders_state(
        #[case] url: &str,
        #[case] slot: Option<SlotState>,
        #[case] expected: &str,
    ) {
        assert_eq!(slot_label(url, slot), expected);
    }
}
