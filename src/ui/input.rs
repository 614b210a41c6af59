use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the kiosk to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskAction {
    None,
    /// A full payload from the keyboard-wedge scanner
    Scan(String),
    Back,
    Forward,
    Quit,
}

/// Collects the characters a keyboard-wedge scanner types until Enter
#[derive(Debug, Default)]
pub struct ScanBuffer {
    buffer: String,
}

impl ScanBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KioskAction {
        if key.kind != KeyEventKind::Press {
            return KioskAction::None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KioskAction::Quit
            }
            KeyCode::Esc => KioskAction::Quit,
            KeyCode::Enter => {
                let payload = std::mem::take(&mut self.buffer);
                let payload = payload.trim();
                if payload.is_empty() {
                    KioskAction::None
                } else {
                    KioskAction::Scan(payload.to_string())
                }
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                KioskAction::None
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                KioskAction::None
            }
            KeyCode::Left => KioskAction::Back,
            KeyCode::Right => KioskAction::Forward,
            _ => KioskAction::None,
        }
    }
}
