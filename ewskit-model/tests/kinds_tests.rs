use chrono::{NaiveDate, TimeZone, Utc};
use ewskit_model::kinds::{
    CalendarItem, CalendarItemType, Contact, FolderItem, FolderType, Message, RecurrencePattern,
    Task,
};
use ewskit_model::{Document, Entity, ModelError, Namespaces, QName, Node, TYPES_NS, Value};
use pretty_assertions::assert_eq;

fn wrap(container: &str, body: &str) -> Document {
    Document::parse(&format!(
        r#"<m:Resp xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                   xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
             <m:{container}>{body}</m:{container}>
           </m:Resp>"#
    ))
    .unwrap()
}

const MEETING: &str = r#"
<t:CalendarItem>
  <t:ItemId Id="mtg-1" ChangeKey="ck"/>
  <t:Subject>Weekly sync</t:Subject>
  <t:Start>2024-01-08T15:00:00Z</t:Start>
  <t:End>2024-01-08T15:30:00Z</t:End>
  <t:CalendarItemType>RecurringMaster</t:CalendarItemType>
  <t:Recurrence>
    <t:WeeklyRecurrence>
      <t:Interval>1</t:Interval>
      <t:DaysOfWeek>Monday Thursday</t:DaysOfWeek>
    </t:WeeklyRecurrence>
    <t:EndDateRecurrence>
      <t:StartDate>2024-01-08</t:StartDate>
      <t:EndDate>2024-06-30Z</t:EndDate>
    </t:EndDateRecurrence>
  </t:Recurrence>
  <t:Organizer><t:Mailbox><t:Name>Olga</t:Name><t:EmailAddress>olga@corp.io</t:EmailAddress></t:Mailbox></t:Organizer>
  <t:RequiredAttendees>
    <t:Attendee>
      <t:Mailbox><t:Name>Ann</t:Name><t:EmailAddress>ann@corp.io</t:EmailAddress></t:Mailbox>
      <t:ResponseType>Accept</t:ResponseType>
      <t:LastResponseTime>2024-01-02T08:00:00Z</t:LastResponseTime>
    </t:Attendee>
    <t:Attendee><t:Mailbox><t:Name>No Email</t:Name></t:Mailbox></t:Attendee>
  </t:RequiredAttendees>
  <t:OptionalAttendees>
    <t:Attendee><t:Mailbox><t:EmailAddress>bo@corp.io</t:EmailAddress></t:Mailbox></t:Attendee>
  </t:OptionalAttendees>
  <t:Resources>
    <t:Attendee><t:Mailbox><t:Name>Room 1</t:Name><t:EmailAddress>room1@corp.io</t:EmailAddress></t:Mailbox></t:Attendee>
  </t:Resources>
  <t:ConflictingMeetings>
    <t:CalendarItem><t:ItemId Id="other-1"/></t:CalendarItem>
    <t:CalendarItem><t:ItemId Id="other-2"/></t:CalendarItem>
  </t:ConflictingMeetings>
</t:CalendarItem>"#;

fn meeting() -> Entity<CalendarItem> {
    let doc = wrap("Items", MEETING);
    Entity::hydrate_from_document(&doc, &Namespaces::ews()).unwrap()
}

// ── Calendar items ───────────────────────────────────────────────

#[test]
fn calendar_item_reads_typed_fields() {
    let event = meeting();
    assert_eq!(event.subject(), Some("Weekly sync"));
    assert_eq!(
        event.start(),
        Some(Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap())
    );
    assert_eq!(event.item_type(), Some(CalendarItemType::RecurringMaster));
    assert_eq!(event.recurrence_pattern(), Some(RecurrencePattern::Weekly));
    assert_eq!(event.recurrence_end_date(), NaiveDate::from_ymd_opt(2024, 6, 30));
    assert_eq!(event.get("recurrence_interval"), Some(&Value::Integer(1)));
    assert!(!event.is_all_day());
}

#[test]
fn organizer_and_attendees_are_collected() {
    let event = meeting();
    let organizer = event.organizer().unwrap();
    assert_eq!(organizer.email, "olga@corp.io");

    let attendees = event.attendees();
    let emails: Vec<&str> = attendees.iter().map(|a| a.email.as_str()).collect();
    assert_eq!(emails, vec!["ann@corp.io", "bo@corp.io"]);
    assert!(attendees[0].required);
    assert!(!attendees[1].required);
    assert_eq!(attendees[0].response.as_deref(), Some("Accept"));
    assert_eq!(attendees[1].last_response, None);

    assert_eq!(event.resources().len(), 1);
}

#[test]
fn conflicting_meetings_do_not_leak_into_the_item() {
    let event = meeting();
    let ids: Vec<String> = event
        .conflicting_meeting_ids()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(ids, vec!["other-1", "other-2"]);
    assert_eq!(event.id().map(|id| id.as_str()), Some("mtg-1"));
}

#[test]
fn calendar_item_type_parses_known_values() {
    assert_eq!(
        "Occurrence".parse::<CalendarItemType>().unwrap(),
        CalendarItemType::Occurrence
    );
    assert!(CalendarItemType::Exception.has_master());
    assert!(!CalendarItemType::RecurringMaster.has_master());
    assert!("Weird".parse::<CalendarItemType>().is_err());
}

#[test]
fn valid_meeting_passes_validation() {
    assert!(meeting().validate().is_ok());
}

#[test]
fn end_before_start_fails_validation() {
    let mut event = meeting();
    event
        .set("end", Some(Utc.with_ymd_and_hms(2024, 1, 8, 14, 0, 0).unwrap().into()))
        .unwrap();
    assert!(matches!(event.validate(), Err(ModelError::Validation(_))));
}

#[test]
fn weekly_recurrence_requires_known_days() {
    let mut event = meeting();
    event
        .set("recurrence_days", Some("Monday Funday".into()))
        .unwrap();
    let err = event.validate().unwrap_err();
    assert_eq!(
        err,
        ModelError::Validation("recurrence_days received unknown value: Funday".to_string())
    );
}

#[test]
fn weekly_interval_is_bounded() {
    let mut event = meeting();
    event.set("recurrence_interval", Some(100i64.into())).unwrap();
    assert!(event.validate().is_err());
}

#[test]
fn recurrence_end_before_start_fails_validation() {
    let mut event = meeting();
    event
        .set(
            "recurrence_end_date",
            Some(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap().into()),
        )
        .unwrap();
    assert!(event.validate().is_err());
}

#[test]
fn raw_recurrence_can_be_replaced() {
    let mut event = meeting();
    let daily = Node::new(QName::new(Some(TYPES_NS), "Recurrence"))
        .with_child(Node::new(QName::new(Some(TYPES_NS), "DailyRecurrence")));
    event.set("recurrence", Some(Value::Raw(daily))).unwrap();
    assert_eq!(event.recurrence_pattern(), Some(RecurrencePattern::Daily));
    assert!(event.is_dirty("recurrence"));
}

// ── Folders ──────────────────────────────────────────────────────

const FOLDER: &str = r#"
<t:CalendarFolder>
  <t:FolderId Id="fld-1" ChangeKey="fck"/>
  <t:ParentFolderId Id="root-1" ChangeKey="rck"/>
  <t:FolderClass>IPF.Appointment</t:FolderClass>
  <t:DisplayName>Team calendar</t:DisplayName>
  <t:TotalCount>12</t:TotalCount>
  <t:ChildFolderCount>0</t:ChildFolderCount>
  <t:EffectiveRights>
    <t:CreateAssociated>true</t:CreateAssociated>
    <t:CreateContents>true</t:CreateContents>
    <t:CreateHierarchy>false</t:CreateHierarchy>
    <t:Delete>true</t:Delete>
    <t:Modify>true</t:Modify>
    <t:Read>true</t:Read>
  </t:EffectiveRights>
</t:CalendarFolder>"#;

#[test]
fn folder_reads_identity_type_and_rights() {
    let doc = wrap("Folders", FOLDER);
    let folder = Entity::<FolderItem>::hydrate_from_document(&doc, &Namespaces::ews()).unwrap();

    assert_eq!(folder.id().map(|id| id.as_str()), Some("fld-1"));
    assert_eq!(folder.parent_id().map(|id| id.to_string()), Some("root-1".to_string()));
    assert_eq!(folder.folder_type(), Some(FolderType::CalendarFolder));
    assert_eq!(folder.display_name(), Some("Team calendar"));
    assert_eq!(folder.get("total_count"), Some(&Value::Integer(12)));

    let rights = folder.effective_rights();
    assert!(rights.read && rights.delete && rights.create_associated);
    assert!(!rights.create_hierarchy);
}

#[test]
fn folder_needs_a_display_name() {
    let folder = Entity::<FolderItem>::new();
    assert!(folder.validate().is_err());
    assert_eq!(folder.folder_type(), None);
}

#[test]
fn new_folder_is_pending_with_dirty_name() {
    let folder = Entity::<FolderItem>::new_folder(FolderType::TasksFolder, "Chores").unwrap();
    assert!(!folder.is_persisted());
    assert_eq!(folder.display_name(), Some("Chores"));
    assert_eq!(folder.folder_type(), Some(FolderType::TasksFolder));
    assert_eq!(folder.dirty_attributes(), vec!["display_name"]);
}

// ── Contacts, tasks, messages ────────────────────────────────────

#[test]
fn contact_birthday_keeps_calendar_date() {
    let doc = wrap(
        "Items",
        r#"<t:Contact>
             <t:ItemId Id="c-1"/>
             <t:DisplayName>Ann Lee</t:DisplayName>
             <t:EmailAddresses>
               <t:Entry Key="EmailAddress1">ann@corp.io</t:Entry>
               <t:Entry Key="EmailAddress3">ann@home.io</t:Entry>
             </t:EmailAddresses>
             <t:PhoneNumbers><t:Entry Key="MobilePhone">555-0100</t:Entry></t:PhoneNumbers>
             <t:PhysicalAddresses>
               <t:Entry Key="Business"><t:City>Oslo</t:City></t:Entry>
             </t:PhysicalAddresses>
             <t:Birthday>1990-04-02T00:00:00Z</t:Birthday>
           </t:Contact>"#,
    );
    let contact = Entity::<Contact>::hydrate_from_document(&doc, &Namespaces::ews()).unwrap();
    assert_eq!(contact.display_name(), Some("Ann Lee"));
    assert_eq!(
        contact.get("birthday").and_then(Value::as_date),
        NaiveDate::from_ymd_opt(1990, 4, 2)
    );
}

#[test]
fn contact_email_addresses_skip_empty_slots() {
    let doc = wrap(
        "Items",
        r#"<t:Contact>
             <t:ItemId Id="c-1"/>
             <t:EmailAddresses>
               <t:Entry Key="EmailAddress1">ann@corp.io</t:Entry>
               <t:Entry Key="EmailAddress3">ann@home.io</t:Entry>
             </t:EmailAddresses>
             <t:PhoneNumbers><t:Entry Key="MobilePhone">555-0100</t:Entry></t:PhoneNumbers>
             <t:PhysicalAddresses>
               <t:Entry Key="Business"><t:City>Oslo</t:City></t:Entry>
             </t:PhysicalAddresses>
           </t:Contact>"#,
    );
    let contact = Entity::<Contact>::hydrate_from_document(&doc, &Namespaces::ews()).unwrap();
    assert_eq!(contact.email_addresses(), vec!["ann@corp.io", "ann@home.io"]);
    assert_eq!(contact.get_str("mobile_phone"), Some("555-0100"));
    let addresses = contact.collection("physical_addresses");
    assert_eq!(addresses[0].get_str("key"), Some("Business"));
    assert_eq!(addresses[0].get_str("city"), Some("Oslo"));
}

#[test]
fn task_reads_string_lists_and_validates_percent() {
    let doc = wrap(
        "Items",
        r#"<t:Task>
             <t:ItemId Id="t-1"/>
             <t:Subject>File taxes</t:Subject>
             <t:Categories><t:String>Home</t:String><t:String>Urgent</t:String></t:Categories>
             <t:PercentComplete>50</t:PercentComplete>
             <t:DueDate>2024-04-15T00:00:00Z</t:DueDate>
           </t:Task>"#,
    );
    let task = Entity::<Task>::hydrate_from_document(&doc, &Namespaces::ews()).unwrap();
    assert_eq!(
        task.get("due_date").and_then(Value::as_date),
        NaiveDate::from_ymd_opt(2024, 4, 15)
    );

    let doc = wrap(
        "Items",
        r#"<t:Task>
             <t:ItemId Id="t-1"/>
             <t:Subject>File taxes</t:Subject>
             <t:Categories><t:String>Home</t:String><t:String>Urgent</t:String></t:Categories>
             <t:PercentComplete>50</t:PercentComplete>
             <t:DueDate>2024-04-15</t:DueDate>
           </t:Task>"#,
    );
    let mut task = Entity::<Task>::hydrate_from_document(&doc, &Namespaces::ews()).unwrap();
    assert_eq!(task.categories(), vec!["Home", "Urgent"]);
    assert!(task.companies().is_empty());
    assert!(task.validate().is_ok());

    task.set("percent_complete", Some(150i64.into())).unwrap();
    assert!(task.validate().is_err());
}

#[test]
fn message_reads_recipients_and_attachments() {
    let doc = wrap(
        "Items",
        r#"<t:Message>
             <t:ItemId Id="msg-1" ChangeKey="mck"/>
             <t:Subject>Hello</t:Subject>
             <t:IsRead>false</t:IsRead>
             <t:Size>1024</t:Size>
             <t:ToRecipients>
               <t:Mailbox><t:Name>Ann</t:Name><t:EmailAddress>ann@corp.io</t:EmailAddress></t:Mailbox>
               <t:Mailbox><t:EmailAddress>bo@corp.io</t:EmailAddress></t:Mailbox>
             </t:ToRecipients>
             <t:Attachments>
               <t:FileAttachment><t:AttachmentId Id="att-1"/><t:Name>a.pdf</t:Name></t:FileAttachment>
             </t:Attachments>
           </t:Message>"#,
    );
    let message = Entity::<Message>::hydrate_from_document(&doc, &Namespaces::ews()).unwrap();
    assert_eq!(message.subject(), Some("Hello"));
    assert!(!message.is_read());
    assert_eq!(
        message.to_recipients(),
        vec![(Some("Ann"), Some("ann@corp.io")), (None, Some("bo@corp.io"))]
    );
    assert_eq!(
        message.collection("attachments")[0].get_str("id"),
        Some("att-1")
    );
}

#[test]
fn hydrate_all_returns_every_entity_in_order() {
    let doc = wrap(
        "Items",
        r#"<t:Message><t:ItemId Id="a"/></t:Message>
           <t:Message><t:ItemId Id="b"/></t:Message>
           <t:Message><t:ItemId Id="c"/></t:Message>"#,
    );
    let messages = Entity::<Message>::hydrate_all(&doc, &Namespaces::ews()).unwrap();
    let ids: Vec<&str> = messages
        .iter()
        .filter_map(|m| m.id().map(|id| id.as_str()))
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}
