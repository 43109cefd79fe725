/// Repair hints carried between attempts: the previous raw response
/// payload and the error it caused. Either side may be absent.
#[derive(Debug, Clone, Default)]
pub(crate) struct RepairHints {
    pub response: Option<String>,
    pub error: Option<String>,
}

impl RepairHints {
    pub fn clear(&mut self) {
        self.response = None;
        self.error = None;
    }
}

/// The user message for one structured call: the serialized table,
/// the task, and any repair hints from the previous attempt.
pub(crate) fn instruction_prompt(table: &str, task: &str, hints: &RepairHints) -> String {
    let mut message = format!("Table:\n{table}\nEnd Table.\nInstructions:\n{task}");
    if let Some(response) = &hints.response {
        message.push_str(&format!(
            "\nYour previous response was {response} which resulted in an error."
        ));
    }
    if let Some(error) = &hints.error {
        message.push_str(&format!("\nThe error was: {error}"));
    }
    message
}
