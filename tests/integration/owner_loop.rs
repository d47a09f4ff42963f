//! The single-owner loop: draining channels and surviving panics.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tasknag::BotConfig;
use tasknag::BotRuntime;
use tasknag::channels::traits::{
    ChannelAdapter, ChannelInboundMessage, ChannelOutboundMessage, DeliveryError,
};
use tasknag::scheduler::JobKind;
use tasknag::tracking::{Dispatcher, FirstPhrase, MemoryStore, StateStore};
use tokio::sync::mpsc;

use crate::helpers::{private, runtime};

/// Panics on the first send, succeeds afterwards.
#[derive(Default)]
struct PanicsOnce {
    sends: AtomicUsize,
}

#[async_trait]
impl ChannelAdapter for PanicsOnce {
    fn id(&self) -> &'static str {
        "panics-once"
    }

    async fn send(&self, _message: ChannelOutboundMessage) -> Result<(), DeliveryError> {
        if self.sends.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("transport exploded");
        }
        Ok(())
    }

    async fn run(&self, _inbound_tx: mpsc::Sender<ChannelInboundMessage>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn loop_survives_a_panicking_callback() {
    let adapter = Arc::new(PanicsOnce::default());
    let bot = BotRuntime::new(
        &BotConfig::default(),
        MemoryStore::new(),
        Dispatcher::new(adapter.clone()).with_pacing(Duration::ZERO),
        Arc::new(FirstPhrase),
    )
    .unwrap();

    let (inbound_tx, inbound_rx) = mpsc::channel(8);
    let (job_tx, job_rx) = mpsc::unbounded_channel::<JobKind>();
    inbound_tx.send(private(1, "/start")).await.unwrap();
    inbound_tx.send(private(2, "/start")).await.unwrap();
    drop(inbound_tx);
    drop(job_tx);

    let store = tokio::time::timeout(Duration::from_secs(5), bot.run(inbound_rx, job_rx))
        .await
        .expect("loop finishes");

    // The first reply panicked after the subscription was stored.
    assert!(store.is_subscribed(1));
    assert!(store.is_subscribed(2));
    assert_eq!(adapter.sends.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn jobs_and_messages_share_one_state() {
    let (bot, out) = runtime();
    let (inbound_tx, inbound_rx) = mpsc::channel(8);
    let (job_tx, job_rx) = mpsc::unbounded_channel();

    inbound_tx.send(private(7, "/start")).await.unwrap();
    drop(inbound_tx);

    let run = tokio::spawn(bot.run(inbound_rx, job_rx));
    // Give the loop a moment to take the subscription before the reset.
    tokio::time::sleep(Duration::from_millis(50)).await;
    job_tx.send(JobKind::DailyReset).unwrap();
    drop(job_tx);

    let store = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("loop finishes")
        .expect("no panic");
    assert!(store.is_subscribed(7));
    assert!(
        out.take_for(7)
            .iter()
            .any(|m| m.starts_with("🔄 A new day has started!"))
    );
}
