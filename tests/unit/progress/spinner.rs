use std::time::Instant;

use indicatif::{InMemoryTerm, ProgressDrawTarget};

use super::*;

fn captured() -> (ProgressSink, InMemoryTerm) {
    let term = InMemoryTerm::new(4, 80);
    let target = ProgressDrawTarget::term_like(Box::new(term.clone()));
    (ProgressSink::Target(target), term)
}

fn wait_for_text(term: &InMemoryTerm) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let text = term.contents();
        if !text.trim().is_empty() || Instant::now() >= deadline {
            return text;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn mmss_counts_minutes_past_the_hour() {
    assert_eq!(format_mmss(Duration::from_secs(65)), "01:05");
    assert_eq!(format_mmss(Duration::from_secs(3725)), "62:05");
}

#[test]
fn hidden_spinner_does_not_tick() {
    let spinner = Spinner::start("Upscaling", ProgressSink::Hidden);
    assert!(!spinner.is_running());
    spinner.stop();
}

#[test]
fn spinner_shows_label_and_elapsed_then_clears() {
    let (sink, term) = captured();
    let spinner = Spinner::start("Upscaling", sink);
    assert!(spinner.is_running());

    let text = wait_for_text(&term);
    assert!(text.starts_with("Upscaling "), "{text}");
    assert!(text.contains("Elapsed: 00:0"), "{text}");
    assert!(FRAMES[..10].iter().any(|f| text.contains(f)), "{text}");

    spinner.stop();
    assert!(term.contents().trim().is_empty());
}

#[test]
fn drop_clears_the_line() {
    let (sink, term) = captured();
    {
        let _spinner = Spinner::start("Upscaling", sink);
        wait_for_text(&term);
    }
    assert!(term.contents().trim().is_empty());
}
