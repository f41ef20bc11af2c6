// tests/crash_screen.rs

use crash_reporter::config::{Config, StatusConfig};
use crash_reporter::display::{HeadlessDisplay, HeadlessFrame, OutputInfo, Transform};
use crash_reporter::geometry::Size;
use crash_reporter::rasterizer::{locate_default_font, FontDriver, HeadlessFontDriver, TextRenderer};
use crash_reporter::CrashReporter;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use test_log::test;

const BACKGROUND: [u8; 4] = [0x33, 0x66, 0x99, 0xff];

fn ok_config() -> Config {
    Config {
        background: "#336699".to_string(),
        status: StatusConfig {
            text: "OK".to_string(),
            x: 10,
            y: 10,
            height_px: 50,
            ..StatusConfig::default()
        },
    }
}

/// Runs `reporter` against `outputs` until every output has been drawn once.
fn run_once<D: FontDriver + 'static>(reporter: CrashReporter<D>, outputs: Vec<OutputInfo>) -> Vec<HeadlessFrame> {
    let reporter = Arc::new(reporter);
    let display = HeadlessDisplay::new(outputs);

    let stopper = {
        let reporter = Arc::clone(&reporter);
        thread::spawn(move || {
            while !reporter.stop() {
                thread::sleep(Duration::from_millis(5));
            }
        })
    };
    reporter.run(&display).unwrap();
    stopper.join().unwrap();

    display.frames()
}

fn pixel(frame: &HeadlessFrame, x: i32, y: i32) -> &[u8] {
    let offset = ((y * frame.size.width + x) * 4) as usize;
    &frame.pixels[offset..offset + 4]
}

fn assert_ok_frame(frame: &HeadlessFrame) {
    assert_eq!(frame.size, Size::new(400, 300));
    for x in 0..400 {
        assert_eq!(pixel(frame, x, 0), BACKGROUND, "row 0, x = {}", x);
    }

    // Both glyphs fit well inside this box at a pixel height of 50.
    let inked = (10..200).any(|y| (10..200).any(|x| pixel(frame, x, y) != BACKGROUND));
    assert!(inked, "no glyph pixels were drawn");
}

#[test]
fn ok_on_blue_with_headless_font() {
    let reporter = CrashReporter::with_renderer(&ok_config(), TextRenderer::with_driver(HeadlessFontDriver::new()));
    let frames = run_once(reporter, vec![OutputInfo::new(400, 300)]);

    assert_eq!(frames.len(), 1);
    assert_ok_frame(&frames[0]);
}

#[test]
fn ok_on_blue_with_system_font() {
    if locate_default_font().is_none() {
        return;
    }
    let reporter = CrashReporter::new(&ok_config()).unwrap();
    let frames = run_once(reporter, vec![OutputInfo::new(400, 300)]);

    assert_eq!(frames.len(), 1);
    assert_ok_frame(&frames[0]);
}

#[test]
fn every_output_is_drawn_and_rotation_swaps_dimensions() {
    let reporter = CrashReporter::with_renderer(&ok_config(), TextRenderer::with_driver(HeadlessFontDriver::new()));
    let frames = run_once(
        reporter,
        vec![
            OutputInfo::new(400, 300),
            OutputInfo::new(400, 300).with_transform(Transform::ROTATE_90 | Transform::ROTATE_180),
            OutputInfo::new(0, 300),
            OutputInfo::new(400, 300).with_scale_factor(2),
        ],
    );

    // The degenerate output is skipped.
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].size, Size::new(400, 300));
    assert_eq!(frames[1].size, Size::new(300, 400));
    assert_eq!(frames[1].pixels.len(), 300 * 400 * 4);
    assert_eq!(frames[2].scale_factor, 2);
}

#[test]
fn run_can_be_repeated_after_stop() {
    let config = ok_config();
    let reporter = Arc::new(CrashReporter::with_renderer(
        &config,
        TextRenderer::with_driver(HeadlessFontDriver::new()),
    ));
    let display = HeadlessDisplay::new(vec![OutputInfo::new(40, 30)]);

    for _ in 0..2 {
        let stopper = {
            let reporter = Arc::clone(&reporter);
            thread::spawn(move || {
                while !reporter.stop() {
                    thread::sleep(Duration::from_millis(5));
                }
            })
        };
        reporter.run(&display).unwrap();
        stopper.join().unwrap();
    }

    assert_eq!(display.frames().len(), 2);
}
