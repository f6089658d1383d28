//! Naming conflicts and member dispatch precedence
//!
//! Conflicts never fail a `use`: the first extension keeps the member, a
//! warning is logged and a `NamingConflict` event is broadcast.

use lite_editor::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Records every event it sees
struct Collector(Arc<Mutex<Vec<EditorEvent>>>);

impl EventHandler for Collector {
    fn handle_event(&mut self, event: &EditorEvent) -> Result<()> {
        self.0.lock().push(event.clone());
        Ok(())
    }

    fn event_filter(&self) -> EventFilter {
        EventFilter::new().include_types(&["NamingConflict"])
    }
}

struct Status(&'static str);

impl Extension for Status {
    fn provides(&self) -> Api {
        let label = self.0;
        Api::new()
            .with_method("status", move |_, _| Ok(json!(label)))
            .with_value(&format!("only{label}"), json!(true))
    }
}

fn status(name: &'static str, label: &'static str) -> DefinitionRef {
    FnDefinition::named(name, move |_| Ok(Box::new(Status(label))))
}

fn instance(facade: &EditorFacade) -> Arc<EditorInstance> {
    facade
        .create_instance(InstanceOptions::new(&MountTarget::new("editor")).with_path("a.md"))
        .unwrap()
}

#[test]
fn test_first_registrant_wins_and_conflict_is_logged() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let facade = EditorFacade::new(Arc::new(MemoryEngine::new()));
    let editor = instance(&facade);
    let events = Arc::new(Mutex::new(Vec::new()));
    facade
        .events()
        .register_handler(Box::new(Collector(events.clone())))
        .unwrap();

    tracing::subscriber::with_default(subscriber, || {
        editor
            .use_extension(&ExtensionUse::new(status("A", "fn")))
            .unwrap();
        editor
            .use_extension(&ExtensionUse::new(status("B", "fn2")))
            .unwrap();
    });

    assert_eq!(editor.invoke("status", &[]).unwrap(), json!("fn"));
    assert_eq!(editor.owner_of("status").as_deref(), Some("A"));
    // non-conflicting members of the losing extension are still merged
    assert_eq!(editor.owner_of("onlyfn2").as_deref(), Some("B"));

    let output = logs.contents();
    assert!(output.contains("naming conflict"), "log output: {output}");
    assert!(output.contains("member=status"), "log output: {output}");
    assert!(output.contains("owner=A"), "log output: {output}");
    assert!(output.contains("rejected=B"), "log output: {output}");

    assert_eq!(
        *events.lock(),
        vec![EditorEvent::NamingConflict {
            instance: editor.id(),
            member: "status".to_string(),
            owner: "A".to_string(),
            rejected: "B".to_string(),
        }]
    );
}

#[test]
fn test_unusing_the_owner_does_not_hand_over_members() {
    let facade = EditorFacade::new(Arc::new(MemoryEngine::new()));
    let editor = instance(&facade);
    editor
        .use_extension(&ExtensionUse::new(status("A", "fn")))
        .unwrap();
    editor
        .use_extension(&ExtensionUse::new(status("B", "fn2")))
        .unwrap();

    editor.unuse_by_name("A").unwrap();

    assert_eq!(editor.resolve("status"), None);
    assert_eq!(editor.owner_of("onlyfn2").as_deref(), Some("B"));
}

#[test]
fn test_extension_shadows_instance_and_widget_members() {
    struct Shadow;

    impl Extension for Shadow {
        fn provides(&self) -> Api {
            Api::new()
                .with_value("getValue", json!("shadowed value"))
                .with_value("extensionsAPI", json!("shadowed api"))
        }
    }

    let facade = EditorFacade::new(Arc::new(MemoryEngine::new()));
    let editor = facade
        .create_instance(
            InstanceOptions::new(&MountTarget::new("editor"))
                .with_path("a.md")
                .with_content("# real"),
        )
        .unwrap();
    assert_eq!(editor.invoke("getValue", &[]).unwrap(), json!("# real"));

    let used = editor
        .use_extension(&ExtensionUse::new(FnDefinition::named("Shadow", |_| {
            Ok(Box::new(Shadow))
        })))
        .unwrap();
    assert_eq!(editor.invoke("getValue", &[]).unwrap(), json!("shadowed value"));
    assert_eq!(editor.invoke("extensionsAPI", &[]).unwrap(), json!("shadowed api"));

    editor.unuse(&used).unwrap();
    assert_eq!(editor.resolve("getValue"), Some(Tier::Widget));
    assert_eq!(editor.resolve("extensionsAPI"), Some(Tier::Instance));
    assert_eq!(editor.invoke("extensionsAPI", &[]).unwrap(), json!([]));
}

#[test]
fn test_instance_members_shadow_widget_members() {
    let facade = EditorFacade::new(Arc::new(MemoryEngine::new()));
    let editor = instance(&facade);

    // both the instance and the widget define these
    for member in ["getId", "dispose"] {
        assert!(editor.widget().has_member(member));
        assert_eq!(editor.resolve(member), Some(Tier::Instance));
    }
    for member in INSTANCE_MEMBERS {
        assert!(editor.has_member(member));
    }
}
