//! Built-in table declarations for the standard object types.
//!
//! Column names are written in snake_case; the schema merger renames them
//! when the connection uses the API-native convention. Names whose CamelCase
//! spelling cannot be derived mechanically pin their remote name.

use crate::schema::{Column, ColumnType};

/// A table known ahead of time.
#[derive(Debug, Clone)]
pub struct StaticTable {
    pub name: &'static str,
    pub object_type: &'static str,
    pub description: &'static str,
    pub columns: fn() -> Vec<Column>,
}

/// Every built-in table.
pub fn static_tables() -> Vec<StaticTable> {
    vec![
        StaticTable {
            name: "salesforce_account",
            object_type: "Account",
            description: "Represents an individual account, which is an organization or person involved with business (such as customers, competitors, and partners).",
            columns: account_columns,
        },
        StaticTable {
            name: "salesforce_contact",
            object_type: "Contact",
            description: "Represents a contact, which is a person associated with an account.",
            columns: contact_columns,
        },
        StaticTable {
            name: "salesforce_order",
            object_type: "Order",
            description: "Represents an order associated with a contract or an account.",
            columns: order_columns,
        },
    ]
}

fn string(name: &str, description: &str) -> Column {
    Column::new(name, ColumnType::String, description)
}

fn double(name: &str, description: &str) -> Column {
    Column::new(name, ColumnType::Double, description)
}

fn boolean(name: &str, description: &str) -> Column {
    Column::new(name, ColumnType::Boolean, description)
}

fn timestamp(name: &str, description: &str) -> Column {
    Column::new(name, ColumnType::Timestamp, description)
}

fn json(name: &str, description: &str) -> Column {
    Column::new(name, ColumnType::Json, description)
}

pub fn account_columns() -> Vec<Column> {
    vec![
        // Top columns
        string("id", "Unique identifier of the account in Salesforce."),
        string("name", "Name of the account."),
        double("annual_revenue", "Estimated annual revenue of the account."),
        string("industry", "Primary business of account."),
        string("owner_id", "The ID of the user who currently owns this account. Default value is the user logged in to the API to perform the create."),
        string("type", "Type of account, for example, Customer, Competitor, or Partner."),
        // Other columns
        string("account_source", "The source of the account record. For example, Advertisement, Data.com, or Trade Show."),
        string("created_by_id", "The id of the user who created the account."),
        timestamp("created_date", "The creation date and time of the account.").sortable(),
        string("description", "Text description of the account."),
        boolean("is_deleted", "Indicates whether the object has been moved to the Recycle Bin (true) or not (false)."),
        string("last_modified_by_id", "The id of the user who last changed the account fields, including modification date and time."),
        timestamp("last_modified_date", "The date and time of last modification to account.").sortable(),
        double("number_of_employees", "Number of employees working at the company represented by this account."),
        string("phone", "The account's primary phone number."),
        string("website", "The website of this account, for example, www.acme.com."),
        // JSON columns
        json("billing_address", "The billing address of the account."),
        json("shipping_address", "The shipping address of the account."),
    ]
}

pub fn contact_columns() -> Vec<Column> {
    vec![
        // Top columns
        string("id", "Unique identifier of the contact in Salesforce."),
        string("name", "The full name of the contact."),
        string("account_id", "ID of the account that's the parent of this contact."),
        string("email", "The contact's email address."),
        string("owner_id", "The ID of the owner of the account associated with this contact."),
        string("title", "Title of the contact, such as CEO or Vice President."),
        // Other columns
        string("created_by_id", "The Created By ID."),
        timestamp("created_date", "The Created Date.").sortable(),
        string("department", "The contact's department."),
        string("fax", "The contact's fax number."),
        boolean("is_deleted", "Indicates whether the object has been moved to the Recycle Bin (true) or not (false)."),
        boolean("is_email_bounced", "If bounce management is activated and an email is sent to a contact, indicates whether the email bounced (true) or not (false)."),
        string("jigsaw", "The Data.com Key."),
        string("jigsaw_contact_id", "References the company's ID in Data.com. If an account has a value in this field, it means that the account was imported from Data.com."),
        timestamp("last_activity_date", "Value is the most recent of either: Due date of the most recent event logged against the record. Due date of the most recently close task associated with the record.").sortable(),
        timestamp("last_cu_request_date", "The Last Stay-in-Touch Request Date.")
            .sortable()
            .remote("LastCURequestDate"),
        timestamp("last_cu_update_date", "The Last Stay-in-Touch Save Date.")
            .sortable()
            .remote("LastCUUpdateDate"),
        string("last_modified_by_id", "The Last Modified By ID."),
        timestamp("last_modified_date", "The Last Modified Date.").sortable(),
        timestamp("last_referenced_date", "The timestamp when the current user last accessed this record, a record related to this record, or a list view.").sortable(),
        timestamp("last_viewed_date", "The timestamp when the current user last viewed this record or list view. If this value is null, the user might have only accessed this record or list view (LastReferencedDate) but not viewed it.").sortable(),
        string("master_record_id", "If this record was deleted as the result of a merge, this field contains the ID of the record that remains."),
        string("mobile_phone", "Contact's mobile phone number."),
        string("phone", "Business telephone number for the contact."),
        string("photo_url", "The Photo URL."),
        string("reports_to_id", "The Reports To ID."),
        timestamp("system_modstamp", "The System Modstamp.").sortable(),
        // JSON columns
        json("mailing_address", "The Mailing Address."),
    ]
}

pub fn order_columns() -> Vec<Column> {
    vec![
        // Top columns
        string("id", "Unique identifier of the order in Salesforce."),
        string("account_id", "ID of the Account associated with this order."),
        string("order_number", "Order number assigned to this order."),
        string("owner_id", "ID of the User or queue that owns this order."),
        string("status", "The Status field specifies the current state of an order. Status strings represent its current state (Draft or Activated)."),
        double("total_amount", "Total amount of the order."),
        string("type", "Type of order."),
        // Other columns
        string("activated_by_id", "ID of the User who activated this order."),
        timestamp("activated_date", "Date and time when the order was activated.").sortable(),
        json("billing_address", "The billing address for the order."),
        string("company_authorized_by_id", "ID of the user who authorized the account associated with the order."),
        string("contract_id", "ID of the contract associated with this order. Can only be updated when the order's StatusCode value is Draft."),
        string("created_by_id", "Id of the user who created the order record."),
        timestamp("created_date", "Creation date and time of the order record.").sortable(),
        string("customer_authorized_by_id", "ID of the contact who authorized the order."),
        string("description", "Description of the order."),
        timestamp("effective_date", "Date at which the order becomes effective.").sortable(),
        timestamp("end_date", "Date at which the order ends.").sortable(),
        boolean("is_deleted", "Indicates that the order is deleted."),
        boolean("is_reduction_order", "Determines whether an order is a reduction order."),
        string("last_modified_by_id", "Id of the user who most recently changed the order record."),
        timestamp("last_modified_date", "Date of most recent change in the order record.").sortable(),
        timestamp("last_referenced_date", "The timestamp when the current user last accessed this record, a record related to this record, or a list view.").sortable(),
        timestamp("last_viewed_date", "The timestamp when the current user last viewed this record or list view. If this value is null, the user might have only accessed this record or list view (LastReferencedDate) but not viewed it.").sortable(),
        string("original_order_id", "Optional. ID of the original order that a reduction order is reducing, if the reduction order is reducing a single order."),
        string("pricebook_2_id", "ID of the price book associated with this order.").remote("Pricebook2Id"),
        string("status_code", "Status code of the stage that the order has reached in the order business process."),
        timestamp("system_modstamp", "The date and time when order record was last modified by a user or by an automated process.").sortable(),
        json("shipping_address", "The shipping address for the order."),
    ]
}
