// src/main.rs

use std::thread;
use std::time::Duration;

use pianotiles::{HttpTransport, Piano, PianoConfig, PointerEvent, gesture::PRIMARY_BUTTON};

/// ===============================
/// Helpers
/// ===============================

const BLOCK_MS: u64 = 10;

fn peak(block: &[f32]) -> f32 {
    block.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
}

fn down(key: &str) -> PointerEvent<'_> {
    PointerEvent::Down {
        key: Some(key),
        buttons: PRIMARY_BUTTON,
    }
}

/// ===============================
/// Main
/// ===============================

fn main() {
    let config = PianoConfig::default();
    let frames_per_block = (config.sample_rate * BLOCK_MS as f64 / 1000.0) as usize;
    let mut piano = Piano::new(config, HttpTransport);
    let mut block = vec![0.0_f32; frames_per_block];

    // --------------------------------
    // Scripted gestures (ms, event)
    // --------------------------------

    let script: Vec<(u64, PointerEvent<'static>)> = vec![
        (0, down("C4")),
        (150, PointerEvent::Leave { key: "C4" }),
        (160, PointerEvent::Over { key: "E4" }),
        (300, PointerEvent::Leave { key: "E4" }),
        (310, PointerEvent::Over { key: "G4" }),
        (500, PointerEvent::Up { key: Some("G4") }),
        (600, down("C5")),
        (900, PointerEvent::Up { key: Some("C5") }),
    ];

    println!("Starting piano sanity test…");

    let mut now_ms = 1_000_u64;
    let t0 = now_ms;
    if let Err(e) = piano.start_recording(now_ms) {
        println!("Could not start recording: {}", e);
        return;
    }

    let mut cursor = 0;
    for step in 0..350 {
        let elapsed = now_ms - t0;
        while cursor < script.len() && script[cursor].0 <= elapsed {
            if let Some(intent) = piano.pointer(script[cursor].1, now_ms) {
                println!("@{:>5} ms  {:?}", elapsed, intent);
            }
            cursor += 1;
        }

        if elapsed == 1_000 {
            match piano.stop_recording(now_ms) {
                Ok(take) => println!("Recorded {} events", take.events().len()),
                Err(e) => println!("Could not stop recording: {}", e),
            }
        }

        let retired = piano.tick(now_ms);
        piano.render(&mut block);

        if retired > 0 || step % 50 == 0 {
            println!(
                "@{:>5} ms  voices={} nodes={} timers={} peak={:.3}",
                elapsed,
                piano.voices().active_count(),
                piano.voices().live_nodes(),
                piano.voices().pending_timers(),
                peak(&block)
            );
        }

        now_ms += BLOCK_MS;
    }

    if let Some(status) = piano.recording_status(now_ms) {
        println!("{}", status);
    }
    match piano.preview_json() {
        Ok(json) => println!("{}", json),
        Err(e) => println!("No preview: {}", e),
    }

    // --------------------------------
    // Save (fire-and-forget)
    // --------------------------------

    match piano.save() {
        Ok(id) => {
            println!("Posting recording #{} to {}", id, piano.config().save_url());
            for _ in 0..20 {
                let outcomes = piano.poll_uploads();
                if let Some(outcome) = outcomes.first() {
                    println!("Save outcome: {:?}", outcome.result);
                    break;
                }
                thread::sleep(Duration::from_millis(100));
            }
        }
        Err(e) => println!("Save skipped: {}", e),
    }

    println!("Sanity test completed.");
}
