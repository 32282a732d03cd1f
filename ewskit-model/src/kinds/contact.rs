use crate::entity::Entity;
use crate::kind::EntityKind;
use crate::schema::{ExtractionSchema, FieldDef};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact;

static SCHEMA: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "contact",
        vec![
            FieldDef::string("folder_id", "t:ParentFolderId/@Id"),
            FieldDef::string("first_name", "t:CompleteName/t:FirstName"),
            FieldDef::string("last_name", "t:CompleteName/t:LastName"),
            FieldDef::string("full_name", "t:CompleteName/t:FullName"),
            FieldDef::string("display_name", "t:DisplayName"),
            FieldDef::string("sort_name", "t:FileAs"),
            FieldDef::string("email_address1", r#"t:EmailAddresses/t:Entry[@Key="EmailAddress1"]"#),
            FieldDef::string("email_address2", r#"t:EmailAddresses/t:Entry[@Key="EmailAddress2"]"#),
            FieldDef::string("email_address3", r#"t:EmailAddresses/t:Entry[@Key="EmailAddress3"]"#),
            FieldDef::date("birthday", "t:Birthday"),
            FieldDef::string("job_title", "t:JobTitle"),
            FieldDef::string("department", "t:Department"),
            FieldDef::string("company_name", "t:CompanyName"),
            FieldDef::string("office_location", "t:OfficeLocation"),
            FieldDef::string("primary_phone", r#"t:PhoneNumbers/t:Entry[@Key="PrimaryPhone"]"#),
            FieldDef::string("business_phone", r#"t:PhoneNumbers/t:Entry[@Key="BusinessPhone"]"#),
            FieldDef::string("home_phone", r#"t:PhoneNumbers/t:Entry[@Key="HomePhone"]"#),
            FieldDef::string("mobile_phone", r#"t:PhoneNumbers/t:Entry[@Key="MobilePhone"]"#),
        ],
    )
    .with_repeated(
        "physical_addresses",
        "t:PhysicalAddresses/t:Entry",
        ExtractionSchema::new(
            "physical_address",
            vec![
                FieldDef::string("key", "@Key"),
                FieldDef::string("street", "t:Street"),
                FieldDef::string("city", "t:City"),
                FieldDef::string("state", "t:State"),
                FieldDef::string("country_or_region", "t:CountryOrRegion"),
                FieldDef::string("postal_code", "t:PostalCode"),
            ],
        ),
    )
});

impl EntityKind for Contact {
    const ELEMENT: &'static str = "t:Contact";

    fn schema() -> &'static ExtractionSchema {
        &SCHEMA
    }
}

impl Entity<Contact> {
    pub fn display_name(&self) -> Option<&str> {
        self.get_str("display_name")
    }

    /// Non-empty email addresses in slot order.
    pub fn email_addresses(&self) -> Vec<&str> {
        ["email_address1", "email_address2", "email_address3"]
            .into_iter()
            .filter_map(|slot| self.get_str(slot))
            .filter(|email| !email.is_empty())
            .collect()
    }
}
