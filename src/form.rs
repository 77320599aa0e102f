use crate::model::ErrorRecord;

/// Create vs. edit mode of the admin form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Editing { code: String },
}

/// The five named inputs of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Code,
    HmiMessage,
    Cause,
    Action,
    Platforms,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Self::Code,
        Self::HmiMessage,
        Self::Cause,
        Self::Action,
        Self::Platforms,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Code => "Code",
            Self::HmiMessage => "HMI Message",
            Self::Cause => "Cause",
            Self::Action => "Action",
            Self::Platforms => "Platforms",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// A backend write requested by the form or the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(ErrorRecord),
    Update { code: String, record: ErrorRecord },
    Delete { code: String },
}

impl Mutation {
    pub fn code(&self) -> &str {
        match self {
            Mutation::Create(record) => &record.code,
            Mutation::Update { code, .. } | Mutation::Delete { code } => code,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "add",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }
}

/// Admin form state: mode, field buffers and focus.
#[derive(Debug, Clone)]
pub struct AdminForm {
    mode: FormMode,
    values: [String; 5],
    focus: Field,
}

impl Default for AdminForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminForm {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            values: Default::default(),
            focus: Field::Code,
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn value(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, FormMode::Editing { .. })
    }

    /// The code input is locked once a record exists.
    pub fn is_enabled(&self, field: Field) -> bool {
        !(field == Field::Code && self.is_editing())
    }

    pub fn title(&self) -> String {
        match &self.mode {
            FormMode::Create => "Add new error code".to_string(),
            FormMode::Editing { code } => format!("Edit error code {}", code),
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Add",
            FormMode::Editing { .. } => "Update",
        }
    }

    /// Back to an empty create form.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Enter edit mode, mirroring `record` into the inputs.
    pub fn begin_edit(&mut self, record: &ErrorRecord) {
        self.values = [
            record.code.clone(),
            record.hmi_message.clone(),
            record.cause.clone(),
            record.action.clone(),
            record.platforms.clone(),
        ];
        self.mode = FormMode::Editing {
            code: record.code.clone(),
        };
        self.focus = Field::HmiMessage;
    }

    #[cfg(test)]
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        if self.is_enabled(field) {
            self.values[field.index()] = value.into();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.is_enabled(self.focus) {
            self.values[self.focus.index()].push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if self.is_enabled(self.focus) {
            self.values[self.focus.index()].pop();
        }
    }

    /// Move focus forward, skipping disabled inputs.
    pub fn focus_next(&mut self) {
        self.step_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.step_focus(Field::ALL.len() - 1);
    }

    fn step_focus(&mut self, step: usize) {
        let len = Field::ALL.len();
        let mut idx = self.focus.index();
        for _ in 0..len {
            idx = (idx + step) % len;
            if self.is_enabled(Field::ALL[idx]) {
                self.focus = Field::ALL[idx];
                return;
            }
        }
    }

    /// Build the typed record from the inputs, field by field.
    fn record(&self) -> ErrorRecord {
        let code = match &self.mode {
            FormMode::Editing { code } => code.clone(),
            FormMode::Create => self.value(Field::Code).trim().to_string(),
        };
        ErrorRecord {
            code,
            hmi_message: self.value(Field::HmiMessage).to_string(),
            cause: self.value(Field::Cause).to_string(),
            action: self.value(Field::Action).to_string(),
            platforms: self.value(Field::Platforms).to_string(),
        }
    }

    /// The mutation a submit would issue. Form state is left untouched;
    /// the caller resets only after the backend accepted it.
    pub fn submit(&self) -> Result<Mutation, String> {
        let record = self.record();
        match &self.mode {
            FormMode::Create if record.code.is_empty() => Err("Code is required.".to_string()),
            FormMode::Create => Ok(Mutation::Create(record)),
            FormMode::Editing { code } => Ok(Mutation::Update {
                code: code.clone(),
                record,
            }),
        }
    }
}
