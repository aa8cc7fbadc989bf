//! Demo: a synthetic jittery network stream played through the bridge.
//!
//! A feeder thread stands in for the transport collaborator, delivering a
//! sine tone at half the native rate in irregularly timed 20 ms frames. The
//! session actor drains the command ring, cpal pulls from the renderer, and
//! session events land in the log.

use anyhow::Result;
use rand::Rng;
use std::f32::consts::PI;
use std::thread;
use std::time::Duration;
use stream_bridge::audio::{ChannelLayout, PcmFrame};
use stream_bridge::output::{AudioOutput, default_output_rate};
use stream_bridge::protocol::Command;
use stream_bridge::session::{BridgeConfig, BridgeSession, SessionActor, actor};
use stream_bridge::SessionEvent;
use tracing::{debug, error, info, warn};

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let native_rate = default_output_rate()?;
    // The bridge only upsamples by integral factors, so simulate a stream
    // at exactly half the native rate.
    let stream_rate = native_rate / 2.0;
    info!(native_rate, stream_rate, "starting stream bridge demo");

    let session = BridgeSession::new(BridgeConfig::new(native_rate));
    let (input, renderer, events) = session.split();

    let (commands, command_rx) = actor::command_channel(256);

    let session_actor = SessionActor::new(command_rx, input);
    thread::spawn(move || session_actor.run());

    thread::spawn(move || {
        for event in events.iter() {
            match event {
                SessionEvent::Status(status) => debug!(?status, "buffer status"),
                SessionEvent::Error(err) => warn!("stream degraded: {err}"),
            }
        }
    });

    thread::spawn(move || feed_sine(commands, stream_rate));

    let _output = AudioOutput::start(renderer)?;

    loop {
        thread::sleep(Duration::from_secs(1));
    }
}

/// Pretend to be the network: 20 ms stereo sine frames with jittered
/// delivery timing.
fn feed_sine(mut commands: rtrb::Producer<Command>, stream_rate: f64) {
    let frame_len = (stream_rate * 0.02) as usize;
    let phase_inc = 2.0 * PI * 440.0 / stream_rate as f32;
    let mut phase = 0.0f32;

    if commands
        .push(Command::SetFormat {
            channels: ChannelLayout::Stereo,
            sample_rate: stream_rate,
        })
        .is_err()
    {
        return;
    }

    let mut rng = rand::thread_rng();
    loop {
        let mut samples = Vec::with_capacity(frame_len * 2);
        for _ in 0..frame_len {
            let value = phase.sin() * 0.2;
            samples.push(value);
            samples.push(value);
            phase = (phase + phase_inc) % (2.0 * PI);
        }

        if commands.push(Command::Accept(PcmFrame::new(samples))).is_err() {
            warn!("command ring full, dropping frame");
        }

        thread::sleep(Duration::from_millis(rng.gen_range(5..40)));
    }
}
