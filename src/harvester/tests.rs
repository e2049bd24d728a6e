use std::path::Path;
use std::time::Duration;

use super::Harvester;
use super::materializer::scroll_to_bottom;
use super::mock::MockSite;
use super::stepper::{LinkedListStepper, StepDecision};
use crate::config::{Dismissal, HarvestConfig, NavigationMode};
use crate::error::HarvestError;
use crate::results::{Outcome, StopReason};

const START: &str = "https://portal.example.dev/documentation/apis/authentication";
const SWAP: &str = "https://portal.example.dev/documentation/apis/swap";
const HISTORY: &str = "https://portal.example.dev/documentation/apis/history";

fn test_config(out: &Path) -> HarvestConfig {
    let mut config = HarvestConfig::new(START);
    config.output_dir = out.to_path_buf();
    config.step_delay_ms = 0;
    config.initial_settle_ms = 0;
    config.settle_ms = 0;
    config.dismiss_timeout_ms = 0;
    config.target_timeout_ms = 0;
    config.nav_timeout_ms = 50;
    config.file_poll_attempts = 3;
    config.file_poll_interval_ms = 1;
    config
}

fn file_names(out: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_linked_list_follows_next_until_end() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let mut site = MockSite::new()
        .page(START, "Authentication", Some(SWAP))
        .page(SWAP, "Swap: Quote?", Some(HISTORY))
        .page(HISTORY, "History", None);

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert_eq!(report.stop_reason(), Some(StopReason::EndOfDocument));
    let sequences: Vec<u32> = report.records.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    let urls: Vec<&str> = report.records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec![START, SWAP, HISTORY]);
    assert_eq!(report.records[1].title, "Swap: Quote?");
    assert_eq!(report.artifact_paths().count(), 9);
    assert!(site.closed);

    assert_eq!(
        file_names(tmp.path()),
        vec![
            "01_Authentication.pdf",
            "01_Authentication.png",
            "01_Authentication.txt",
            "02_Swap_ Quote_.pdf",
            "02_Swap_ Quote_.png",
            "02_Swap_ Quote_.txt",
            "03_History.pdf",
            "03_History.png",
            "03_History.txt",
            "manifest.json",
        ]
    );
    let text = std::fs::read_to_string(tmp.path().join("03_History.txt")).unwrap();
    assert_eq!(text, format!("History\n\nbody of {}\n", HISTORY));
}

#[tokio::test]
async fn test_linked_list_stops_on_cycle() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let looped = format!("{}#top", START);
    let mut site = MockSite::new().page(START, "Authentication", Some(&looped));

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert_eq!(report.stop_reason(), Some(StopReason::CycleDetected));
    assert_eq!(report.records.len(), 1);
    assert_eq!(site.clicks, vec![format!("next:{}", looped)]);
}

#[tokio::test]
async fn test_linked_list_without_next_control() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let mut site = MockSite::new().page(START, "Authentication", None);

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert_eq!(report.stop_reason(), Some(StopReason::EndOfDocument));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].sequence, 1);
    assert!(site.clicks.is_empty());
}

#[tokio::test]
async fn test_stuck_navigation_keeps_partial_results() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    // "Next" points at the page itself, so the URL never changes
    let mut site = MockSite::new()
        .page(START, "Authentication", Some(SWAP))
        .page(SWAP, "Swap", Some(SWAP));

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(!report.is_success());
    match report.error() {
        Some(HarvestError::StepperTimeout { url, control, .. }) => {
            assert_eq!(url, SWAP);
            assert_eq!(control, "Next");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(report.records.len(), 2);
    assert!(site.closed);

    let manifest: serde_json::Value = serde_json::from_slice(
        &std::fs::read(tmp.path().join("manifest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["error"]["kind"], "stepper_timeout");
    assert_eq!(manifest["records"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_navigation_failure_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let mut site = MockSite::new().page(START, "Authentication", None);
    site.fail_navigation = true;

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(matches!(
        report.outcome,
        Outcome::Aborted(HarvestError::NavigationFailed { .. })
    ));
    assert!(report.records.is_empty());
    assert!(site.closed);
}

#[tokio::test]
async fn test_missing_capture_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let mut site = MockSite::new().page(START, "Authentication", Some(SWAP));
    site.empty_screenshot = true;

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(matches!(
        report.error(),
        Some(HarvestError::CaptureTimeout { attempts: 3, .. })
    ));
    assert!(report.records.is_empty());
    assert!(site.clicks.is_empty());
}

#[tokio::test]
async fn test_invalid_config_still_closes_session() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.start_url = "portal.example.dev".to_string();
    let mut site = MockSite::new();

    let result = Harvester::new(&config).run(&mut site).await;

    assert!(matches!(result, Err(HarvestError::InvalidUrl { .. })));
    assert!(site.closed);
}

#[tokio::test]
async fn test_page_limit_and_start_number() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.start_number = 15;
    config.max_pages = Some(2);
    config.title_suffix = Some(" - Example Developer Portal".to_string());
    let mut site = MockSite::new()
        .page(START, "Authentication - Example Developer Portal", Some(SWAP))
        .page(SWAP, "Swap - Example Developer Portal", Some(HISTORY))
        .page(HISTORY, "History", None);

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert_eq!(report.stop_reason(), Some(StopReason::PageLimit));
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].sequence, 15);
    assert_eq!(report.records[1].sequence, 16);
    assert_eq!(report.records[1].title, "Swap");
    assert!(tmp.path().join("16_Swap.png").exists());
}

#[tokio::test]
async fn test_target_list_skips_missing_label() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.start_url = "https://portal.example.dev/documentation/overview".to_string();
    config.mode = NavigationMode::TargetList;
    config.target_labels = vec![
        "Overview".to_string(),
        "MissingLabel".to_string(),
        "Authentication".to_string(),
    ];
    let mut site = MockSite::new()
        .page("https://portal.example.dev/documentation/overview", "Overview", None)
        .page(START, "Authentication", None)
        .target("Overview", "https://portal.example.dev/documentation/overview")
        .target("Authentication", START);

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert_eq!(report.stop_reason(), Some(StopReason::TargetsExhausted));
    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Overview", "Authentication"]);
    let sequences: Vec<u32> = report.records.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
    assert_eq!(
        file_names(tmp.path()),
        vec![
            "Authentication.png",
            "Authentication.txt",
            "Overview.png",
            "Overview.txt",
            "manifest.json",
        ]
    );
}

#[tokio::test]
async fn test_target_list_tolerates_click_errors_and_duplicates() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.mode = NavigationMode::TargetList;
    config.target_labels = vec![
        "Authentication".to_string(),
        "Broken".to_string(),
        "Auth again".to_string(),
        "Swap APIs".to_string(),
    ];
    let mut site = MockSite::new()
        .page(START, "Authentication", None)
        .page(SWAP, "Swap", None)
        .target("Authentication", START)
        .target("Auth again", START)
        .target("Swap APIs", SWAP);
    site.broken_targets.push("Broken".to_string());

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(report.is_success());
    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Authentication", "Swap APIs"]);
}

#[tokio::test]
async fn test_dismissals_are_optional() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.dismissals = vec![
        Dismissal::ButtonText {
            text: "I agree".to_string(),
        },
        Dismissal::Selector {
            selector: "#cdk-overlay-2 .close".to_string(),
        },
    ];
    let mut site = MockSite::new().page(START, "Authentication", None);
    site.overlays.push("I agree".to_string());

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(report.is_success());
    assert_eq!(site.clicks, vec!["dismiss:I agree".to_string()]);
}

#[tokio::test]
async fn test_scroll_is_capped_when_height_keeps_growing() {
    let mut site = MockSite::new();
    site.height = 500;
    site.height_growth = 1000;

    let summary = scroll_to_bottom(&mut site, 800, std::time::Duration::ZERO, 7)
        .await
        .unwrap();

    assert_eq!(summary.steps, 7);
    assert!(!summary.reached_bottom);
    assert_eq!(site.scroll_steps, 7);
}

#[tokio::test]
async fn test_scroll_reaches_bottom() {
    let mut site = MockSite::new();
    site.height = 2000;

    let summary = scroll_to_bottom(&mut site, 800, std::time::Duration::ZERO, 100)
        .await
        .unwrap();

    assert_eq!(summary.steps, 3);
    assert!(summary.reached_bottom);
}

#[tokio::test]
async fn test_visited_set_grows_one_per_step() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let urls = [START, SWAP, HISTORY];
    let mut site = MockSite::new()
        .page(START, "Authentication", Some(SWAP))
        .page(SWAP, "Swap", Some(HISTORY))
        .page(HISTORY, "History", None);
    site.current = START.to_string();

    let mut stepper = LinkedListStepper::new(&config);
    for (n, url) in urls.iter().enumerate() {
        assert_eq!(stepper.enter(url), StepDecision::Continue(url.to_string()));
        assert_eq!(stepper.visited().len(), n + 1);
        let decision = stepper.advance(&mut site).await.unwrap();
        match urls.get(n + 1) {
            Some(next) => assert_eq!(decision, StepDecision::Continue(next.to_string())),
            None => assert_eq!(decision, StepDecision::Stop(StopReason::EndOfDocument)),
        }
    }
    assert_eq!(
        stepper.enter(&format!("{}#section", SWAP)),
        StepDecision::Stop(StopReason::CycleDetected)
    );
    assert_eq!(stepper.visited().len(), 3);
}

#[tokio::test]
async fn test_next_waits_for_new_page_to_settle() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.nav_timeout_ms = 1000;
    config.settle_ms = 30;
    let mut site = MockSite::new()
        .page(START, "Authentication", Some(SWAP))
        .page(SWAP, "Swap", Some(HISTORY))
        .page(HISTORY, "History", None);

    let started = std::time::Instant::now();
    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(report.is_success());
    let idle_urls: Vec<&str> = site.idle_waits.iter().map(|(u, _)| u.as_str()).collect();
    assert_eq!(idle_urls, vec![START, SWAP, HISTORY]);
    assert!(
        site.idle_waits
            .iter()
            .all(|(_, bound)| *bound <= Duration::from_millis(1000))
    );
    // One settle after each of the two "next" clicks
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_initial_load_shares_one_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.nav_timeout_ms = 200;
    let mut site = MockSite::new().page(START, "Authentication", None);
    site.goto_delay = Duration::from_millis(80);

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(report.is_success());
    let (url, bound) = &site.idle_waits[0];
    assert_eq!(url, START);
    assert!(*bound <= Duration::from_millis(120), "idle bound was {:?}", bound);
}

#[tokio::test]
async fn test_driver_failure_during_capture_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let mut site = MockSite::new()
        .page(START, "Authentication", Some(SWAP))
        .page(SWAP, "Swap", Some(HISTORY))
        .page(HISTORY, "History", None);
    site.fail_pdf_at = Some(SWAP.to_string());

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(matches!(
        report.error(),
        Some(HarvestError::CaptureFailed { artifact: "PDF", .. })
    ));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].url, START);
    assert!(site.closed);
    assert!(tmp.path().join("01_Authentication.pdf").exists());
    assert!(!tmp.path().join("02_Swap.pdf").exists());
}

#[tokio::test]
async fn test_dismissal_driver_error_is_swallowed() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.dismissals = vec![
        Dismissal::ButtonText {
            text: "I agree".to_string(),
        },
        Dismissal::Selector {
            selector: "#popup .close".to_string(),
        },
    ];
    let mut site = MockSite::new().page(START, "Authentication", None);
    site.overlays = vec!["I agree".to_string(), "#popup .close".to_string()];
    site.broken_overlays.push("I agree".to_string());

    let report = Harvester::new(&config).run(&mut site).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.records.len(), 1);
    assert_eq!(site.clicks, vec!["dismiss:#popup .close".to_string()]);
}
