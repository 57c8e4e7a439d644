use std::time::Duration;
use sync_editor::CollabEditor;
use system::SyncConfig;

/// Drives an editor through a short scripted session and prints what JavaScript would be
/// asked to do after each step.
fn main() {
    let config = SyncConfig::new("ws://localhost:8080", "demo");
    let mut editor = CollabEditor::from_config(config, "replay".into(), Duration::ZERO)
        .expect("valid config");

    let frames = [
        r##"{"type":"init","content":"Hello World","userId":"replay","color":"#FF6B6B"}"##,
        r##"{"type":"userJoined","userId":"peer","color":"#4ECDC4"}"##,
        r##"{"type":"cursor","userId":"peer","cursorPos":3,"color":"#4ECDC4"}"##,
        r#"{"type":"update","userId":"peer","content":"HelXlo World"}"#,
    ];

    editor.connect();
    println!("connect: {}", editor.consume_effects());
    editor.channel_opened();
    println!("open: {}", editor.consume_effects());
    for (i, frame) in frames.iter().enumerate() {
        editor.channel_message(frame);
        if i == 0 {
            // caret before "d"
            editor.local_cursor(10);
        }
        println!("{}\n  -> {}", frame, editor.consume_effects());
    }

    editor.local_input(1_000.0, "HelXlo World!", 13);
    println!("input: {}", editor.consume_effects());
    editor.tick(editor.next_deadline_ms());
    println!("tick: {}", editor.consume_effects());
}
