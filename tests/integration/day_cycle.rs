//! End-to-end days: posting lists and reports, sweeps, reset and commands.

use crate::helpers::{
    GROUP, IT_TOPIC, MONTHLY_TOPIC, SPORT_TOPIC, date, in_thread, local, private, runtime,
};
use tasknag::channels::traits::ChannelInboundMessage;
use tasknag::scheduler::JobKind;
use tasknag::tracking::{StateStore, Track};

const IT_LIST: &str = "My plan:\n1. Fix login\n2. Write docs\n3. Deploy";

#[tokio::test]
async fn reminders_follow_the_user_through_a_day() {
    let (mut bot, out) = runtime();
    let today = date(10);

    bot.handle_inbound_on(private(1, "/start"), today).await;
    assert!(out.take_for(1)[0].starts_with("🔔 You are subscribed"));

    bot.handle_inbound_on(in_thread(1, IT_TOPIC, IT_LIST), today).await;
    let replies = out.take();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].chat_id, GROUP);
    assert_eq!(replies[0].thread_id, Some(IT_TOPIC));
    assert!(replies[0].text.contains("list of 3 tasks"));

    // Before the start hour nothing goes out.
    bot.run_job_at(JobKind::GeneralSweep, local(10, 9, 0)).await;
    assert!(out.take().is_empty());

    bot.run_job_at(JobKind::GeneralSweep, local(10, 11, 0)).await;
    let reminders = out.take_for(1);
    assert_eq!(reminders.len(), 2);
    assert!(
        reminders
            .iter()
            .any(|r| r.contains("You haven't reported on your IT tasks today"))
    );
    assert!(
        reminders
            .iter()
            .any(|r| r.contains("You haven't set your sport list"))
    );

    bot.handle_inbound_on(
        in_thread(1, IT_TOPIC, "Interim summary: did 1 tasks"),
        today,
    )
    .await;
    assert!(out.take()[0].text.contains("2 of 3 tasks left"));

    bot.run_job_at(JobKind::ProgressSweep, local(10, 12, 0)).await;
    let nudges = out.take_for(1);
    assert_eq!(nudges.len(), 1);
    assert!(nudges[0].contains("You have 2 of 3 tasks left."));

    // A reported track drops out of the general sweep.
    bot.run_job_at(JobKind::GeneralSweep, local(10, 13, 0)).await;
    let reminders = out.take_for(1);
    assert_eq!(reminders.len(), 1);
    assert!(reminders[0].contains("sport"));

    bot.handle_inbound_on(
        in_thread(1, IT_TOPIC, "Finished all tasks for today!"),
        today,
    )
    .await;
    assert!(out.take()[0].text.contains("finished all IT tasks for today"));

    bot.run_job_at(JobKind::ProgressSweep, local(10, 14, 0)).await;
    assert!(out.take().is_empty());

    // Midnight: marks cleared, lists kept, everyone greeted.
    bot.run_job_at(JobKind::DailyReset, local(11, 0, 0)).await;
    let greetings = out.take_for(1);
    assert_eq!(greetings.len(), 1);
    assert!(greetings[0].starts_with("🔄 A new day has started!"));

    let progress = bot.store().progress(1, Track::It).unwrap();
    assert_eq!(progress.remaining, 3);
    assert!(!progress.wrote_progress_today);
    assert_eq!(bot.store().completed_on(1, Track::It), None);

    bot.run_job_at(JobKind::GeneralSweep, local(11, 10, 0)).await;
    let reminders = out.take_for(1);
    assert!(
        reminders
            .iter()
            .any(|r| r.contains("You haven't reported on your IT tasks today"))
    );
}

#[tokio::test]
async fn reports_need_a_list_and_a_count() {
    let (mut bot, out) = runtime();
    let today = date(10);

    bot.handle_inbound_on(
        in_thread(2, SPORT_TOPIC, "Sport interim summary: did 2 exercises"),
        today,
    )
    .await;
    assert!(out.take()[0].text.contains("first post your list in the Sport topic"));

    bot.handle_inbound_on(
        in_thread(2, SPORT_TOPIC, "1. Squats\n2. Push-ups\n3. Plank\n4. Run"),
        today,
    )
    .await;
    assert!(out.take()[0].text.contains("list of 4 exercises"));

    bot.handle_inbound_on(in_thread(2, SPORT_TOPIC, "sport interim summary"), today)
        .await;
    assert!(out.take()[0].text.contains("how many exercises did you finish"));
    assert_eq!(bot.store().progress(2, Track::Sport).unwrap().remaining, 4);

    // Reporting everything done completes the track.
    bot.handle_inbound_on(
        in_thread(2, SPORT_TOPIC, "Sport interim summary: did 4 exercises"),
        today,
    )
    .await;
    assert!(out.take()[0].text.contains("finished all sport exercises"));
    assert_eq!(bot.store().completed_on(2, Track::Sport), Some(today));
}

#[tokio::test]
async fn goals_show_up_in_reminders_and_commands() {
    let (mut bot, out) = runtime();
    let today = date(10);

    bot.handle_inbound_on(private(3, "/start"), today).await;
    bot.handle_inbound_on(
        in_thread(
            3,
            MONTHLY_TOPIC,
            "Goals for the month:\n1. Read 4 books\n2. Run 100 km\n3. Learn Rust\n4. Sleep more",
        ),
        today,
    )
    .await;
    let replies = out.take();
    assert!(replies.last().unwrap().text.contains("set 4 goals"));

    bot.run_job_at(JobKind::GeneralSweep, local(10, 11, 0)).await;
    for reminder in out.take_for(3) {
        assert!(reminder.contains("🎯 Don't forget your goals for the month:"));
        assert!(reminder.contains("• Read 4 books"));
        assert!(reminder.contains("• ... and 1 more"));
    }

    bot.handle_inbound_on(private(3, "/mygoals"), today).await;
    let view = out.take_for(3).remove(0);
    assert!(view.contains("Goals set on: 10.03.2026"));
    assert!(view.contains("Total goals: 4"));
}

#[tokio::test]
async fn blocked_user_is_dropped_from_later_sweeps() {
    let (mut bot, out) = runtime();
    let today = date(10);
    for user in [1, 2] {
        bot.handle_inbound_on(private(user, "/start"), today).await;
    }
    out.take();
    out.block(2);

    bot.run_job_at(JobKind::GeneralSweep, local(10, 11, 0)).await;
    assert!(!bot.store().is_subscribed(2));
    assert!(bot.store().is_subscribed(1));
    assert_eq!(out.take_for(1).len(), 2);

    bot.run_job_at(JobKind::GeneralSweep, local(10, 12, 0)).await;
    let sent = out.take();
    assert!(sent.iter().all(|m| m.chat_id == 1));
}

#[tokio::test]
async fn morning_nudge_skips_users_with_both_lists() {
    let (mut bot, out) = runtime();
    let today = date(10);
    for user in [1, 2] {
        bot.handle_inbound_on(private(user, "/start"), today).await;
    }
    bot.handle_inbound_on(in_thread(1, IT_TOPIC, IT_LIST), today)
        .await;
    bot.handle_inbound_on(in_thread(1, SPORT_TOPIC, "1. Run"), today)
        .await;
    out.take();

    bot.run_job_at(JobKind::MorningNudge, local(10, 10, 0)).await;
    let sent = out.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, 2);
    assert!(sent[0].text.starts_with("⏰ Good morning!"));
}

#[tokio::test]
async fn commands_answer_in_place_with_bot_suffix() {
    let (mut bot, out) = runtime();
    bot.handle_inbound_on(in_thread(5, IT_TOPIC, "/status@tasknag_bot"), date(10))
        .await;
    let sent = out.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, GROUP);
    assert_eq!(sent[0].thread_id, Some(IT_TOPIC));
    assert!(sent[0].text.starts_with("📊 YOUR STATUS"));
}

#[tokio::test]
async fn messages_outside_the_tracked_threads_are_ignored() {
    let (mut bot, out) = runtime();
    let elsewhere = ChannelInboundMessage {
        chat_id: -42,
        ..in_thread(1, IT_TOPIC, IT_LIST)
    };
    bot.handle_inbound_on(elsewhere, date(10)).await;
    bot.handle_inbound_on(in_thread(1, 999, IT_LIST), date(10))
        .await;
    bot.handle_inbound_on(private(1, IT_LIST), date(10)).await;

    assert!(out.take().is_empty());
    assert!(bot.store().progress(1, Track::It).is_none());
}
