use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use spool_core::domain::{TaskEvent, TaskRecord};
use spool_core::queue::{PutOptions, SpoolQueue, TaskQueue};

#[tokio::main]
async fn main() {
    // (A) Build a queue: tube "mail" may run two tasks at once, and a taken
    // task has 400ms to finish before it is handed back.
    let queue = Arc::new(
        SpoolQueue::builder()
            .ttr(Duration::from_millis(400))
            .limit("mail", 2)
            .on_task_change(|task: &TaskRecord, event: Option<TaskEvent>| {
                let kind = event.map_or("-", |e| e.as_str());
                println!("  event: {} {:?} ({kind})", task.id, task.status);
            })
            .build()
            .expect("queue config is valid"),
    );

    // (B) Produce a few prioritized tasks. Lower pri runs first.
    for (pri, name) in [(5, "digest"), (1, "welcome"), (5, "newsletter")] {
        let task = queue
            .put(
                serde_json::json!({ "mail": name }),
                PutOptions::default().pri(pri).tube("mail"),
            )
            .await;
        println!("put {} pri={pri} -> {:?}", task.id, task.status);
    }

    // (C) Consume: take -> work -> delete. Deleting a running task frees its
    // tube slot, so the blocked third task surfaces on its own.
    while let Some(task) = queue.take().await {
        println!("working on {} data={}", task.id, task.data);
        queue.delete(task.id).await;
    }

    // (D) A task whose consumer goes silent comes back after its ttr.
    let put = queue
        .put(
            serde_json::json!({ "mail": "retry-me" }),
            PutOptions::default().tube("mail"),
        )
        .await;
    let taken = queue.take().await.expect("task is ready");
    println!("took {} and abandoned it", taken.id);
    sleep(Duration::from_millis(600)).await;
    let again = queue.take().await.expect("ttr expiry requeued the task");
    assert_eq!(again.id, put.id);
    queue.delete(again.id).await;

    println!("counts: {:?}", queue.counts_by_status().await);

    // (E) Stop the timekeeper.
    queue.shutdown().await;
}
