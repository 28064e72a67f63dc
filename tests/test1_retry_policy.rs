mod common;

use std::sync::{Arc, Mutex};

use common::{harness, quiet_config, server_gone, syntax_error, Reply};
use sql_steward::prelude::*;

#[tokio::test]
async fn reconnects_and_succeeds_within_budget() {
    let (connector, state) = harness();
    {
        let mut state = state.lock().expect("state");
        state.script("INSERT INTO posts", Reply::Fail(server_gone()));
        state.script("INSERT INTO posts", Reply::Fail(server_gone()));
        state.script("INSERT INTO posts", Reply::Affected(1));
    }

    let mut db = ConnectionManager::new(connector, quiet_config());
    let stmt = db.prepare("INSERT INTO posts (title) VALUES (?)");
    let affected = db
        .execute(&stmt, &[SqlValue::Text("hello".into())])
        .await
        .expect("third attempt succeeds");
    assert_eq!(affected, 1);

    let state = state.lock().expect("state");
    // Initial connect plus one reconnect per dropped attempt.
    assert_eq!(state.connects, 3);
    assert_eq!(state.issued_matching("INSERT INTO posts"), 3);
}

#[tokio::test]
async fn exhausted_budget_propagates_final_error() {
    let (connector, state) = harness();
    {
        let mut state = state.lock().expect("state");
        for _ in 0..3 {
            state.script("UPDATE posts", Reply::Fail(server_gone()));
        }
    }

    let mut db = ConnectionManager::new(connector, quiet_config());
    let stmt = db.prepare("UPDATE posts SET title = 'x'");
    let err = db.execute(&stmt, &[]).await.expect_err("budget exhausted");
    assert!(err.is_connection_dropped());
    assert_eq!(err.code(), Some(2006));

    let state = state.lock().expect("state");
    assert_eq!(state.issued_matching("UPDATE posts"), 3);
}

#[tokio::test]
async fn non_reconnect_errors_fail_on_first_attempt() {
    let (connector, state) = harness();
    state
        .lock()
        .expect("state")
        .script("DELETE FROM posts", Reply::Fail(syntax_error()));

    let mut db = ConnectionManager::new(connector, quiet_config());
    let stmt = db.prepare("DELETE FROM posts WHERE");
    let err = db.execute(&stmt, &[]).await.expect_err("syntax error");
    assert_eq!(err.code(), Some(1064));

    let state = state.lock().expect("state");
    assert_eq!(state.issued_matching("DELETE FROM posts"), 1);
    assert_eq!(state.connects, 1);
}

#[tokio::test]
async fn record_mode_suppresses_terminal_error() {
    let (connector, state) = harness();
    state
        .lock()
        .expect("state")
        .script("UPDATE posts", Reply::Fail(syntax_error()));

    let mut db = ConnectionManager::new(connector, quiet_config());
    let stmt = db.prepare("UPDATE posts SET title = 'x'");
    let outcome = db
        .execute_with(&stmt, &[], ErrorMode::Record, 3)
        .await
        .expect("record mode returns Ok");
    assert_eq!(outcome, None);

    let last = db.last_error().expect("warning recorded");
    assert_eq!(last.code, Some(1064));
    assert!(last.message.contains("SQL syntax"));
}

#[tokio::test]
async fn record_mode_still_retries_dropped_connections() {
    let (connector, state) = harness();
    {
        let mut state = state.lock().expect("state");
        state.script("SELECT id", Reply::Fail(server_gone()));
        state.script(
            "SELECT id",
            Reply::Rows(common::single_column("id", &["1"])),
        );
    }

    let mut db = ConnectionManager::new(connector, quiet_config());
    let stmt = db.prepare("SELECT id FROM posts");
    let rows = db
        .query_with(&stmt, &[], ErrorMode::Record, 3)
        .await
        .expect("ok")
        .expect("rows after one reconnect");
    assert_eq!(rows.rows.len(), 1);
    assert_eq!(state.lock().expect("state").connects, 2);
}

#[tokio::test]
async fn success_clears_previous_error() {
    let (connector, state) = harness();
    state
        .lock()
        .expect("state")
        .script("UPDATE posts", Reply::Fail(syntax_error()));

    let mut db = ConnectionManager::new(connector, quiet_config());
    let stmt = db.prepare("UPDATE posts SET title = 'x'");
    let outcome = db
        .execute_with(&stmt, &[], ErrorMode::Record, 3)
        .await
        .expect("record mode");
    assert_eq!(outcome, None);
    assert!(db.last_error().is_some());

    // No reply scripted for the second run, so it succeeds.
    let outcome = db
        .execute_with(&stmt, &[], ErrorMode::Record, 3)
        .await
        .expect("record mode");
    assert_eq!(outcome, Some(0));
    assert!(db.last_error().is_none());
}

#[tokio::test]
async fn unknown_column_fires_hook_without_retry() {
    let (connector, state) = harness();
    state.lock().expect("state").script(
        "SELECT excerpt",
        Reply::Fail(StewardError::Server {
            code: 1054,
            message: "Unknown column 'posts.excerpt' in 'field list'".to_string(),
        }),
    );

    let hits: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
    let recorder = hits.clone();
    let mut db = ConnectionManager::new(connector, quiet_config()).with_unknown_column_hook(
        move |table, column| {
            recorder
                .lock()
                .expect("hits")
                .push((table.to_string(), column.to_string()));
        },
    );

    let stmt = db.prepare("SELECT excerpt FROM posts");
    let err = db.query(&stmt, &[]).await.expect_err("unknown column");
    assert_eq!(err.code(), Some(1054));

    let hits = hits.lock().expect("hits");
    assert_eq!(hits.as_slice(), [("posts".to_string(), "excerpt".to_string())]);
    assert_eq!(state.lock().expect("state").issued_matching("SELECT excerpt"), 1);
}
