mod common;

use std::time::Duration;

use common::{memory_backend, open_session};
use ledger_grid::{SessionCommand, SessionRunner, SyncStatus};
use lgrid_config::Config;
use lgrid_core::SuggestionChoice;
use lgrid_domain::{Cell, SheetFormat};
use tokio::sync::{mpsc, oneshot, watch};

#[tokio::test(start_paused = true)]
async fn rapid_edits_coalesce_into_one_flush() {
    let (store, backend) = memory_backend();
    let (session, _view) = open_session(&Config::default(), backend, SheetFormat::Weekly, 2025, 1);
    let (commands, receiver) = mpsc::channel(16);
    let (status_tx, mut status) = watch::channel(SyncStatus::Ready);
    let runner = tokio::spawn(SessionRunner::new(session).run(receiver, status_tx));

    for day in 0..5 {
        commands
            .send(SessionCommand::Edit {
                row: 0,
                col: 9 + day,
                value: "50".into(),
            })
            .await
            .expect("send edit");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(store.write_count(), 0);

    status
        .wait_for(|current| matches!(current, SyncStatus::Saved(_)))
        .await
        .expect("saved");
    // One row document plus the sheet metadata.
    assert_eq!(store.write_count(), 2);

    commands.send(SessionCommand::Close).await.expect("close");
    let session = runner.await.expect("join").expect("run");
    assert!(session.is_closed());
    assert_eq!(store.write_count(), 2);
    assert_eq!(session.grid().get(0, 16).unwrap(), &Cell::Number(250.0));
}

#[tokio::test(start_paused = true)]
async fn failed_flush_is_retried_with_backoff() {
    let (store, backend) = memory_backend();
    let (session, _view) = open_session(&Config::default(), backend, SheetFormat::Daily, 2025, 4);
    let (commands, receiver) = mpsc::channel(16);
    let (status_tx, mut status) = watch::channel(SyncStatus::Ready);
    let runner = tokio::spawn(SessionRunner::new(session).run(receiver, status_tx));

    store.set_fail_writes(true);
    commands
        .send(SessionCommand::Edit {
            row: 2,
            col: 6,
            value: "900".into(),
        })
        .await
        .expect("send edit");
    status
        .wait_for(|current| matches!(current, SyncStatus::Error(_)))
        .await
        .expect("error reported");
    assert_eq!(store.write_count(), 0);

    store.set_fail_writes(false);
    status
        .wait_for(|current| matches!(current, SyncStatus::Saved("documents")))
        .await
        .expect("retried");
    assert_eq!(store.write_count(), 2);

    drop(commands);
    let session = runner.await.expect("join").expect("run");
    assert!(!session.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn suggestions_and_manual_save_over_the_channel() {
    let (store, backend) = memory_backend();
    let (session, _view) = open_session(&Config::default(), backend, SheetFormat::Daily, 2025, 4);
    let (commands, receiver) = mpsc::channel(16);
    let (status_tx, mut status) = watch::channel(SyncStatus::Ready);
    let runner = tokio::spawn(SessionRunner::new(session).run(receiver, status_tx));

    commands
        .send(SessionCommand::Edit {
            row: 1,
            col: 9,
            value: "200".into(),
        })
        .await
        .expect("send edit");
    let (reply, answer) = oneshot::channel();
    commands
        .send(SessionCommand::Suggest {
            row: 1,
            col: 10,
            reply,
        })
        .await
        .expect("send suggest");
    let suggestion = answer.await.expect("reply").expect("period column");
    assert_eq!(suggestion.carry_forward, Cell::Number(200.0));

    commands
        .send(SessionCommand::ApplySuggestion {
            row: 1,
            col: 10,
            choice: SuggestionChoice::CarryForward,
        })
        .await
        .expect("send apply");
    commands.send(SessionCommand::SaveNow).await.expect("send save");
    status
        .wait_for(|current| matches!(current, SyncStatus::Saved(_)))
        .await
        .expect("saved");
    assert_eq!(store.write_count(), 2);

    commands.send(SessionCommand::Close).await.expect("close");
    let session = runner.await.expect("join").expect("run");
    assert_eq!(session.grid().get(1, 10).unwrap(), &Cell::Number(200.0));
    assert_eq!(
        session.grid().get(1, session.layout().balance_column()).unwrap(),
        &Cell::Number(-400.0)
    );
}
