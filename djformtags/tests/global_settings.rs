//! Engines built from the process-wide settings.
//!
//! Kept in its own test binary: the global settings can be configured only
//! once per process.

use djformtags_core::logging::setup_logging;
use djformtags_core::{Settings, SETTINGS};
use djformtags_forms::{FieldDef, Form};
use djformtags_template::{Context, Engine};

#[test]
fn test_configured_settings_reach_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("row.html"), "{{ field.label }}|{{ note }}").unwrap();

    let toml = format!(
        "log_level = \"warn\"\n[templates]\ndirs = [{:?}]\nauto_escape = false\n",
        dir.path().to_string_lossy()
    );
    SETTINGS
        .configure(Settings::from_toml_str(&toml).unwrap())
        .unwrap();
    setup_logging(SETTINGS.get());

    let mut engine = Engine::from_global_settings();
    assert!(!engine.auto_escape());
    djformtags::register(&mut engine);

    let mut ctx = Context::new();
    ctx.set("form", Form::new(vec![FieldDef::char("field", Some(100))]));
    let out = engine
        .render_string(
            r#"{% load formtags %}{% formrow form.field template="row.html" note="<b>" %}"#,
            &mut ctx,
        )
        .unwrap();
    assert_eq!(out, "Field|<b>");

    assert!(SETTINGS.configure(Settings::default()).is_err());
}
