use std::io::Read;
use std::thread::{self, JoinHandle};

use checklist_core::alert::{self, RecordingNotifier};
use checklist_core::config::Config;
use checklist_core::controller::{Outcome, SyncController};
use checklist_core::form::FormHandler;
use checklist_core::render::{ListItem, Renderer};
use checklist_core::service::{HttpTaskService, TaskService};
use checklist_core::task::{NewTask, TaskId, TaskPatch};
use tiny_http::{Header, Response, Server};

#[derive(Debug)]
struct Recorded {
    method: String,
    path: String,
    content_type: Option<String>,
    body: String,
}

/// Answers requests with the scripted responses, in order, then stops.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let base = format!("http://{}/api/tasks", server.server_addr());

    let handle = thread::spawn(move || {
        let mut recorded = Vec::with_capacity(responses.len());
        for (status, body) in responses {
            let mut request = server.recv().expect("receive request");

            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());
            let mut text = String::new();
            request
                .as_reader()
                .read_to_string(&mut text)
                .expect("request body");
            recorded.push(Recorded {
                method: request.method().as_str().to_string(),
                path: request.url().to_string(),
                content_type,
                body: text,
            });

            let json = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .expect("content type header");
            request
                .respond(
                    Response::from_string(body)
                        .with_status_code(status)
                        .with_header(json),
                )
                .expect("respond");
        }
        recorded
    });

    (base, handle)
}

fn json(text: &str) -> serde_json::Value {
    serde_json::from_str(text).expect("json body")
}

#[test]
fn speaks_the_task_collection_protocol() {
    let (base, server) = serve(vec![
        (200, r#"[{"id":1,"text":"buy milk","completed":false}]"#),
        (201, r#"{"id":"2","text":"walk dog","completed":false}"#),
        (200, r#"{"id":"1","text":"buy milk","completed":true}"#),
        (204, ""),
    ]);
    let mut service = HttpTaskService::new(&base).expect("service");

    let tasks = service.list().expect("list");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, TaskId::from("1"));

    service
        .create(&NewTask::pending("walk dog"))
        .expect("create");
    service
        .update(&TaskId::from("1"), TaskPatch { completed: true })
        .expect("update");
    service.delete(&TaskId::from("1")).expect("delete");

    let recorded = server.join().expect("server thread");
    let summary: Vec<(&str, &str)> = recorded
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            ("GET", "/api/tasks"),
            ("POST", "/api/tasks"),
            ("PUT", "/api/tasks/1"),
            ("DELETE", "/api/tasks/1"),
        ]
    );
    assert_eq!(
        json(&recorded[1].body),
        serde_json::json!({"text": "walk dog", "completed": false})
    );
    assert_eq!(json(&recorded[2].body), serde_json::json!({"completed": true}));
    assert_eq!(recorded[1].content_type.as_deref(), Some("application/json"));
    assert!(recorded[3].body.is_empty());
}

#[test]
fn non_success_status_is_an_error() {
    let (base, server) = serve(vec![(500, r#"{"error":"boom"}"#), (404, "{}")]);
    let mut service = HttpTaskService::new(&base).expect("service");

    let err = service.list().expect_err("500 must fail");
    assert!(format!("{err:#}").contains("500"));
    assert!(
        service
            .update(&TaskId::from("9"), TaskPatch { completed: false })
            .is_err()
    );

    server.join().expect("server thread");
}

fn http_controller(base: &str) -> SyncController<HttpTaskService, RecordingNotifier> {
    let service = HttpTaskService::new(base).expect("service");
    let renderer = Renderer::new(&Config::defaults()).expect("renderer");
    SyncController::new(service, RecordingNotifier::default(), renderer)
}

#[test]
fn delete_then_empty_reload_shows_placeholders() {
    let (base, server) = serve(vec![
        (200, r#"[{"id":1,"text":"buy milk","completed":false}]"#),
        (204, ""),
        (200, "[]"),
    ]);
    let mut ctl = http_controller(&base);

    assert_eq!(ctl.load(), Outcome::Applied);
    assert_eq!(ctl.remove(&TaskId::from("1")), Outcome::Applied);

    assert!(ctl.snapshot().is_empty());
    let page = ctl.renderer().page();
    assert_eq!(page.pending.heading, "Pending tasks (0)");
    assert_eq!(page.pending.items, vec![ListItem::Placeholder("All done!")]);
    assert_eq!(
        page.completed.items,
        vec![ListItem::Placeholder("Nothing finished yet.")]
    );
    assert!(ctl.notifier().messages.is_empty());

    server.join().expect("server thread");
}

#[test]
fn rejected_create_keeps_the_typed_text() {
    let (base, server) = serve(vec![
        (200, r#"[{"id":1,"text":"buy milk","completed":false}]"#),
        (422, r#"{"error":"nope"}"#),
    ]);
    let mut ctl = http_controller(&base);
    assert_eq!(ctl.load(), Outcome::Applied);
    let before = ctl.snapshot().clone();

    let mut form = FormHandler::new();
    form.set_input("call mom");
    assert_eq!(form.submit(&mut ctl), Outcome::Failed);

    assert_eq!(form.input(), "call mom");
    assert_eq!(ctl.snapshot(), &before);
    assert_eq!(ctl.notifier().messages, vec![alert::CREATE_FAILED.to_string()]);

    let recorded = server.join().expect("server thread");
    assert_eq!(recorded.len(), 2);
}
