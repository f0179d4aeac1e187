//! Sender configuration, as read by the `useSenderSetting` mapper.

use serde::{Deserialize, Serialize};

/// Separator between organization and client in a full sender name.
pub const FULL_NAME_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Inactive,
    Testing,
    Active,
}

impl CustomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Testing => "testing",
            Self::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingType {
    #[default]
    Sync,
    Async,
}

impl ProcessingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Async => "async",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Format {
    #[default]
    Csv,
    Hl7,
    Hl7Batch,
    Fhir,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Hl7 => "HL7",
            Self::Hl7Batch => "HL7_BATCH",
            Self::Fhir => "FHIR",
        }
    }
}

/// Read-only sender settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    pub name: String,
    pub organization_name: String,
    pub topic: String,
    pub schema_name: String,
    pub processing_type: ProcessingType,
    pub format: Format,
    pub customer_status: CustomerStatus,
}

impl Sender {
    pub fn new(organization_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            organization_name: organization_name.into(),
            ..Self::default()
        }
    }

    /// `org.sender`
    pub fn full_name(&self) -> String {
        format!(
            "{}{FULL_NAME_SEPARATOR}{}",
            self.organization_name, self.name
        )
    }

    /// `P` for active senders, `T` for everyone still testing or inactive.
    pub fn processing_mode_code(&self) -> &'static str {
        match self.customer_status {
            CustomerStatus::Active => "P",
            CustomerStatus::Testing | CustomerStatus::Inactive => "T",
        }
    }

    /// Reads a setting by its camelCase property name.
    pub fn setting(&self, property: &str) -> Option<String> {
        let value = match property {
            "name" => self.name.clone(),
            "organizationName" => self.organization_name.clone(),
            "fullName" => self.full_name(),
            "topic" => self.topic.clone(),
            "schemaName" => self.schema_name.clone(),
            "processingType" => self.processing_type.as_str().to_string(),
            "format" => self.format.as_str().to_string(),
            "customerStatus" => self.customer_status.as_str().to_string(),
            "processingModeCode" => self.processing_mode_code().to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Splits `org.client` into its parts; a name without separator is all organization.
    pub fn split_full_name(full_name: &str) -> (&str, &str) {
        full_name
            .split_once(FULL_NAME_SEPARATOR)
            .unwrap_or((full_name, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_are_reflected_by_name() {
        let sender = Sender {
            topic: "covid-19".to_string(),
            customer_status: CustomerStatus::Active,
            ..Sender::new("lab", "default")
        };
        assert_eq!(sender.setting("fullName").as_deref(), Some("lab.default"));
        assert_eq!(sender.setting("processingModeCode").as_deref(), Some("P"));
        assert_eq!(sender.setting("format").as_deref(), Some("CSV"));
        assert_eq!(sender.setting("bogus"), None);
    }

    #[test]
    fn split_full_name_without_client() {
        assert_eq!(Sender::split_full_name("lab.default"), ("lab", "default"));
        assert_eq!(Sender::split_full_name("lab"), ("lab", ""));
    }
}
