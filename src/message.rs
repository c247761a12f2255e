//! Editor input messages.
//!
//! The presentation layer reports every annotation action as an
//! [`EditorMessage`]. Messages are also the unit of recorded annotation
//! scripts, a JSON array replayed by the command line front-end.

use serde::{Deserialize, Serialize};

use crate::editor::{PointerButton, PolygonEditor, UndoAction};
use crate::model::{ClassPalette, Extent, PanelPoint};

/// Messages that change the editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorMessage {
    /// Pointer press at panel coordinates
    Pointer {
        x: f64,
        y: f64,
        button: PointerButton,
    },
    /// Commit the candidate points
    Commit,
    Undo,
    /// Change the class used for future commits
    SetClass { tag: String },
    /// Display panel was resized
    ResizePanel { width: f64, height: f64 },
}

/// Errors raised while handling messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    #[error("Invalid annotation script: {0}")]
    Script(#[from] serde_json::Error),
}

/// Parse a JSON array of messages.
pub fn parse_script(json: &str) -> Result<Vec<EditorMessage>, MessageError> {
    Ok(serde_json::from_str(json)?)
}

/// Apply one message to the editor.
pub fn handle_editor_message(
    msg: EditorMessage,
    editor: &mut PolygonEditor,
    palette: &ClassPalette,
) -> Result<(), MessageError> {
    match msg {
        EditorMessage::Pointer { x, y, button } => {
            editor.handle_pointer(PanelPoint::new(x, y), button);
        }
        EditorMessage::Commit => {
            editor.commit_polygon();
        }
        EditorMessage::Undo => match editor.undo() {
            UndoAction::ClearedCandidates => log::debug!("Undo: cleared candidate points"),
            UndoAction::RemovedPolygon => log::debug!("Undo: removed last polygon"),
            UndoAction::Nothing => log::debug!("Undo: nothing to undo"),
        },
        EditorMessage::SetClass { tag } => {
            if !palette.contains(&tag) {
                return Err(MessageError::UnknownClass(tag));
            }
            editor.set_active_class(tag);
        }
        EditorMessage::ResizePanel { width, height } => {
            editor.resize_panel(Extent::new(width, height));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_classes;

    fn editor() -> PolygonEditor {
        let mut editor = PolygonEditor::new("added building", Extent::new(400.0, 400.0));
        editor.load_image(Extent::new(800.0, 600.0));
        editor
    }

    #[test]
    fn test_parse_script() {
        let script = r#"[
            { "action": "pointer", "x": 10, "y": 10, "button": "left" },
            { "action": "set_class", "tag": "uncertain" },
            { "action": "commit" },
            { "action": "resize_panel", "width": 300, "height": 200 }
        ]"#;
        let messages = parse_script(script).unwrap();
        assert_eq!(
            messages,
            vec![
                EditorMessage::Pointer {
                    x: 10.0,
                    y: 10.0,
                    button: PointerButton::Left
                },
                EditorMessage::SetClass {
                    tag: "uncertain".to_string()
                },
                EditorMessage::Commit,
                EditorMessage::ResizePanel {
                    width: 300.0,
                    height: 200.0
                },
            ]
        );
    }

    #[test]
    fn test_parse_script_rejects_unknown_action() {
        assert!(matches!(
            parse_script(r#"[{ "action": "move" }]"#),
            Err(MessageError::Script(_))
        ));
    }

    #[test]
    fn test_replay_builds_polygons() {
        let palette = default_classes();
        let mut editor = editor();
        let script = r#"[
            { "action": "pointer", "x": 10, "y": 10, "button": "left" },
            { "action": "pointer", "x": 50, "y": 10, "button": "left" },
            { "action": "pointer", "x": 30, "y": 40, "button": "left" },
            { "action": "pointer", "x": 0, "y": 0, "button": "right" },
            { "action": "set_class", "tag": "removed building" },
            { "action": "pointer", "x": 1, "y": 1, "button": "left" },
            { "action": "undo" },
            { "action": "pointer", "x": 5, "y": 5, "button": "left" },
            { "action": "commit" }
        ]"#;
        for msg in parse_script(script).unwrap() {
            handle_editor_message(msg, &mut editor, &palette).unwrap();
        }

        let export = editor.export_polygons();
        assert_eq!(export.tags, vec!["added building", "removed building"]);
        assert_eq!(export.polygons[0].len(), 3);
        assert_eq!(export.polygons[1].len(), 1);
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut editor = editor();
        let err = handle_editor_message(
            EditorMessage::SetClass {
                tag: "pond".to_string(),
            },
            &mut editor,
            &default_classes(),
        )
        .unwrap_err();
        assert!(matches!(err, MessageError::UnknownClass(tag) if tag == "pond"));
        assert_eq!(editor.active_class(), "added building");
    }

    #[test]
    fn test_resize_panel() {
        let mut editor = editor();
        handle_editor_message(
            EditorMessage::ResizePanel {
                width: 300.0,
                height: 200.0,
            },
            &mut editor,
            &default_classes(),
        )
        .unwrap();
        assert_eq!(editor.panel(), Extent::new(300.0, 200.0));
    }
}
