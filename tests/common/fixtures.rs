//! Static input and detail corpora used across harnesses.

/// Three input records in JSON Lines form, keyed by source label.
pub const INPUT_JSONL: &str = r#"{"CB_NO":"JH100001","CASE NUMBER":"JG100001","NAME":null,"AGE":null,"ARREST LOCATION":null,"ARREST DATE":"01/15/2024 10:30:00 PM","RACE":"BLACK","CHARGE 1 STATUTE":"720 ILCS 5.0/12-3.2-A-1","CHARGES STATUTE":"720 ILCS 5.0/12-3.2-A-1"}
{"CB_NO":"JH100002","CASE NUMBER":"JG100002","ARREST DATE":"01/16/2024 01:05:00 AM","RACE":"WHITE","CHARGE 1 STATUTE":"720 ILCS 5.0/12-3.4-A-1"}
{"CB_NO":"JH100003","CASE NUMBER":"JG100003","ARREST DATE":"01/17/2024 07:45:00 PM","RACE":"WHITE HISPANIC","CHARGE 1 STATUTE":"720 ILCS 5.0/12-3.3-A-1","EXTRA COLUMN":"ignored"}
"#;

/// Detail documents for the first and third input record. The second is a
/// recorded navigation failure.
pub const DETAILS_JSON: &str = r#"{
  "JH100001": { "NAME": "DOE,\n   JOHN", "AGE": "34", "ARREST LOCATION": "001XX  W MADISON ST", "CB #": "JH100001" },
  "JH100002": "timed out waiting for Details link",
  "JH100003": { "Name": "ROE, JANE", "Age": 27, "Arrest Location": "\t062XX S HALSTED ST" }
}"#;

/// Labels as they appear on detail pages, with their expected column names.
pub const LABEL_CORPUS: &[(&str, &str)] = &[
    ("CB_NO", "cb_no"),
    ("CASE NUMBER", "case_number"),
    ("ARREST LOCATION", "arrest_location"),
    ("Arrest Location:", "arrest_location"),
    ("CHARGE 1 STATUTE", "charge_1_statute"),
    ("CHARGES CLASS", "charges_class"),
    ("CB #", "cb"),
    ("  Date/Time of Arrest ", "date_time_of_arrest"),
];
