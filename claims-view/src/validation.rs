//! Patient claim submission form and the checks run before it is posted.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ValidationError;

/// Largest accepted attachment, in bytes.
pub const MAX_ATTACHMENT_BYTES: usize = 500 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/png", "text/plain"];

/// Form fields in display order with their labels.
pub const REQUIRED_FIELDS: [(&str, &str); 17] = [
    ("patientName", "Patient Name"),
    ("patientId", "Patient ID"),
    ("dob", "Date of Birth"),
    ("phone", "Phone Number"),
    ("policyNumber", "Policy Number"),
    ("provider", "Insurance Provider"),
    ("claimAmount", "Claim Amount"),
    ("treatmentDate", "Treatment Date"),
    ("treatment", "Treatment Provided"),
    ("diagnosis", "Diagnosis"),
    ("hospitalName", "Hospital Name"),
    ("hospitalLocation", "Hospital Location"),
    ("procedureName", "Procedure Name"),
    ("doctorNotes", "Doctor Notes"),
    ("patientMedicalHistory", "Patient Medical History"),
    ("itemizedBill", "Itemized Bill"),
    ("insuranceStartDate", "Insurance Start Date"),
];

/// An uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_allowed_type(&self) -> bool {
        ALLOWED_MIME_TYPES.contains(&self.mime.as_str())
    }
}

/// The logged-in patient a submission is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submitter {
    pub name: String,
    pub patient_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaimSubmission {
    pub patient_name: String,
    pub patient_id: String,
    pub dob: String,
    pub phone: String,
    pub policy_number: String,
    pub provider: String,
    pub claim_amount: String,
    pub treatment_date: String,
    pub treatment: String,
    pub diagnosis: String,
    pub hospital_name: String,
    pub hospital_location: String,
    pub procedure_name: String,
    pub doctor_notes: String,
    pub patient_medical_history: String,
    pub itemized_bill: String,
    pub insurance_start_date: String,
}

impl ClaimSubmission {
    /// Value of a form field by its form key.
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "patientName" => &self.patient_name,
            "patientId" => &self.patient_id,
            "dob" => &self.dob,
            "phone" => &self.phone,
            "policyNumber" => &self.policy_number,
            "provider" => &self.provider,
            "claimAmount" => &self.claim_amount,
            "treatmentDate" => &self.treatment_date,
            "treatment" => &self.treatment,
            "diagnosis" => &self.diagnosis,
            "hospitalName" => &self.hospital_name,
            "hospitalLocation" => &self.hospital_location,
            "procedureName" => &self.procedure_name,
            "doctorNotes" => &self.doctor_notes,
            "patientMedicalHistory" => &self.patient_medical_history,
            "itemizedBill" => &self.itemized_bill,
            "insuranceStartDate" => &self.insurance_start_date,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Labels of required fields that are blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .filter(|(key, _)| self.field(key).is_none_or(|v| v.trim().is_empty()))
            .map(|(_, label)| *label)
            .collect()
    }

    /// Run every check in order and stop at the first failure.
    pub fn validate(
        &self,
        submitter: &Submitter,
        attachments: &[Attachment],
    ) -> Result<(), ValidationError> {
        if self.patient_name.trim() != submitter.name {
            return Err(ValidationError::PatientNameMismatch);
        }
        if self.patient_id.trim() != submitter.patient_id {
            return Err(ValidationError::PatientIdMismatch);
        }

        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let oversized: Vec<String> = attachments
            .iter()
            .filter(|a| a.size() > MAX_ATTACHMENT_BYTES)
            .map(|a| a.name.clone())
            .collect();
        if !oversized.is_empty() {
            return Err(ValidationError::OversizedFiles(oversized));
        }

        let invalid: Vec<String> = attachments
            .iter()
            .filter(|a| !a.is_allowed_type())
            .map(|a| a.name.clone())
            .collect();
        if !invalid.is_empty() {
            return Err(ValidationError::InvalidFileTypes(invalid));
        }

        Ok(())
    }

    /// The `claimData` part posted to `/patient-claim`.
    pub fn claim_data(&self, attachments: &[Attachment]) -> Value {
        let documents: Vec<Value> = attachments
            .iter()
            .map(|a| json!({"name": a.name, "size": a.size(), "type": a.mime}))
            .collect();

        json!({
            "patientName": self.patient_name,
            "patientId": self.patient_id,
            "dateOfBirth": self.dob,
            "phoneNumber": self.phone,
            "policyNumber": self.policy_number,
            "insuranceProvider": self.provider,
            "claimAmount": self.claim_amount,
            "treatmentDate": self.treatment_date,
            "treatmentProvided": self.treatment,
            "diagnosis": self.diagnosis,
            "hospitalName": self.hospital_name,
            "hospitalLocation": self.hospital_location,
            "procedureName": self.procedure_name,
            "doctorNotes": self.doctor_notes,
            "patientMedicalHistory": self.patient_medical_history,
            "itemizedBill": self.itemized_bill,
            "insuranceStartDate": self.insurance_start_date,
            "documents": documents,
        })
    }
}
