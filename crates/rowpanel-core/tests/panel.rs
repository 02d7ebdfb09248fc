use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use rowpanel_core::{
    CommandKind, DataPanel, DataSource, MemorySource, PanelError, PanelHost, PanelOptions,
    SaveChoice,
};
use rowpanel_map::ColumnSpec;
use rowpanel_model::{Column, FieldName, FieldType, RowId, RowState, Schema, Table, Value};

#[derive(Default)]
struct ScriptHost {
    save_choices: VecDeque<SaveChoice>,
    close_answers: VecDeque<bool>,
    confirm_answers: VecDeque<bool>,
    prompts: usize,
    errors: Vec<String>,
    details: Vec<RowId>,
}

impl PanelHost for ScriptHost {
    fn ask_save_changes(&mut self) -> SaveChoice {
        self.prompts += 1;
        self.save_choices
            .pop_front()
            .expect("unexpected save prompt")
    }

    fn ask_save_on_close(&mut self) -> bool {
        self.prompts += 1;
        self.close_answers
            .pop_front()
            .expect("unexpected close prompt")
    }

    fn confirm_delete(&mut self, _count: usize) -> bool {
        self.confirm_answers.pop_front().unwrap_or(true)
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn open_detail(&mut self, id: RowId) {
        self.details.push(id);
    }
}

/// Wraps a memory source and fails chosen write-back calls.
struct FlakySource {
    inner: MemorySource,
    fail_on: Vec<usize>,
    update_calls: usize,
}

impl FlakySource {
    fn new(inner: MemorySource, fail_on: &[usize]) -> Self {
        Self {
            inner,
            fail_on: fail_on.to_vec(),
            update_calls: 0,
        }
    }
}

impl DataSource for FlakySource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn can_fill(&self) -> bool {
        self.inner.can_fill()
    }

    fn fill(&mut self) -> rowpanel_core::Result<Table> {
        self.inner.fill()
    }

    fn can_build_commands(&self) -> bool {
        self.inner.can_build_commands()
    }

    fn has_command(&self, kind: CommandKind) -> bool {
        self.inner.has_command(kind)
    }

    fn build_command(&mut self, kind: CommandKind) -> rowpanel_core::Result<()> {
        self.inner.build_command(kind)
    }

    fn update(&mut self, table: &Table) -> rowpanel_core::Result<()> {
        self.update_calls += 1;
        if self.fail_on.contains(&self.update_calls) {
            return Err(PanelError::Provider(
                "injected backend failure".to_string(),
            ));
        }
        self.inner.update(table)
    }
}

/// A source with no select operation at all.
struct NoSelectSource;

impl DataSource for NoSelectSource {
    fn name(&self) -> &str {
        "void"
    }

    fn can_fill(&self) -> bool {
        false
    }

    fn fill(&mut self) -> rowpanel_core::Result<Table> {
        Err(PanelError::Provider("fill without a select".to_string()))
    }

    fn can_build_commands(&self) -> bool {
        false
    }

    fn has_command(&self, _kind: CommandKind) -> bool {
        false
    }

    fn build_command(&mut self, _kind: CommandKind) -> rowpanel_core::Result<()> {
        Err(PanelError::Config("no builder".to_string()))
    }

    fn update(&mut self, _table: &Table) -> rowpanel_core::Result<()> {
        Err(PanelError::Provider("no commands".to_string()))
    }
}

fn people_schema() -> Schema {
    Schema::new(vec![
        Column::new(FieldName::new("id").unwrap(), FieldType::Int),
        Column::new(FieldName::new("owner").unwrap(), FieldType::Text),
    ])
}

fn people_source() -> MemorySource {
    let mut source = MemorySource::new("people", people_schema());
    source
        .push(vec![Value::Int(1), Value::Text("alice".to_string())])
        .unwrap();
    source
        .push(vec![Value::Int(2), Value::Text("bob".to_string())])
        .unwrap();
    source
        .push(vec![Value::Int(3), Value::Text("carol".to_string())])
        .unwrap();
    source
}

fn spec_columns() -> Vec<ColumnSpec> {
    vec![ColumnSpec::new("id", "N"), ColumnSpec::new("owner", "O")]
}

fn open_panel<S: DataSource>(source: S) -> DataPanel<S> {
    let mut panel = DataPanel::new(source).with_columns(spec_columns());
    panel.open().unwrap();
    panel
}

#[test]
fn open_without_select_is_a_configuration_error() {
    let mut panel = DataPanel::new(NoSelectSource);
    let err = panel.open().unwrap_err();
    assert!(matches!(err, PanelError::Config(_)));
    assert!(!panel.is_open());
}

#[test]
fn open_reuses_a_caller_supplied_table() {
    let mut table = Table::new("people", people_schema());
    table
        .push_row(vec![Value::Int(1), Value::Text("alice".to_string())])
        .unwrap();

    // NoSelectSource would fail any fill attempt.
    let mut panel = DataPanel::new(NoSelectSource)
        .with_table(table)
        .with_columns(spec_columns());
    panel.open().unwrap();
    assert_eq!(panel.items().len(), 1);
}

#[test]
fn open_with_duplicate_role_is_a_usage_error() {
    let mut panel = DataPanel::new(people_source()).with_columns(vec![
        ColumnSpec::new("id", "N"),
        ColumnSpec::new("owner", "N"),
    ]);
    let err = panel.open().unwrap_err();
    assert!(matches!(err, PanelError::Usage(_)));
    assert!(!panel.is_open());
}

#[test]
fn open_resolves_roles_automatically_without_a_spec() {
    let mut panel = DataPanel::new(people_source());
    panel.open().unwrap();

    let map = panel.role_map().unwrap();
    assert_eq!(map.name, Some(0));
    assert_eq!(map.description, Some(1));
    assert_eq!(panel.items().len(), 3);
}

#[test]
fn open_is_idempotent() {
    let mut panel = open_panel(people_source());
    panel.open().unwrap();
    assert_eq!(panel.items().len(), 3);
}

#[test]
fn title_names_the_table() {
    let panel = open_panel(people_source());
    assert_eq!(panel.title(), "Table people");

    let unopened: DataPanel<MemorySource> = DataPanel::new(people_source());
    assert_eq!(unopened.title(), "Data Table");
}

#[test]
fn create_marks_dirty_and_opens_the_detail_editor() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());
    panel.update_items();
    assert!(!panel.is_dirty());

    let id = panel.create(&mut host).unwrap();

    assert!(panel.is_dirty());
    assert!(panel.items().contains(&id));
    assert_eq!(host.details, vec![id]);
    assert_eq!(
        panel.table().unwrap().row(id).unwrap().state(),
        RowState::Added
    );
    assert!(panel.source().has_command(CommandKind::Insert));
}

#[test]
fn create_without_builder_fails_without_side_effects() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source().without_builder());

    let err = panel.create(&mut host).unwrap_err();
    assert!(matches!(err, PanelError::Config(_)));
    assert_eq!(panel.items().len(), 3);
    assert!(host.details.is_empty());
}

#[test]
fn clean_save_clears_pending_state_and_close_needs_no_prompt() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());

    let id = panel.create(&mut host).unwrap();
    {
        let table = panel.table_mut().unwrap();
        table.set_value(id, 0, Value::Int(4)).unwrap();
        table.set_value(id, 1, Value::Text("dave".to_string())).unwrap();
    }
    assert!(panel.is_dirty());

    assert!(panel.save(&mut host).unwrap());
    assert!(!panel.has_pending_changes());
    assert_eq!(panel.source().len(), 4);

    panel.update_items();
    assert!(!panel.is_dirty());
    assert_eq!(panel.items().len(), 4);

    // No scripted prompt: ScriptHost panics if one is requested.
    assert!(panel.can_close(&mut host).unwrap());
    assert_eq!(host.prompts, 0);
}

#[test]
fn save_ensures_all_three_commands() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());
    assert!(panel.save(&mut host).unwrap());
    for kind in CommandKind::ALL {
        assert!(panel.source().has_command(kind));
    }
    assert_eq!(panel.source().build_calls(), 3);
}

#[test]
fn close_without_changes_never_prompts() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());
    assert!(panel.can_close(&mut host).unwrap());
    assert_eq!(host.prompts, 0);
}

#[test]
fn partial_batch_delete_stops_at_the_first_failure() {
    let mut host = ScriptHost::default();
    let source = FlakySource::new(people_source(), &[2]);
    let mut panel = open_panel(source);
    let selected: Vec<RowId> = panel.items().to_vec();

    panel.delete_items(&mut host, &selected).unwrap();

    // First delete committed, second rolled back, third never attempted.
    let table = panel.table().unwrap();
    assert!(table.row(selected[0]).is_none());
    assert_eq!(table.row(selected[1]).unwrap().state(), RowState::Unchanged);
    assert_eq!(table.row(selected[2]).unwrap().state(), RowState::Unchanged);
    assert_eq!(host.errors.len(), 1);
    assert_eq!(panel.source().update_calls, 2);

    panel.update_items();
    assert_eq!(panel.items(), &selected[1..]);

    let kept: Vec<String> = panel
        .source()
        .inner
        .rows()
        .map(|values| values[1].display())
        .collect();
    assert_eq!(kept, vec!["bob".to_string(), "carol".to_string()]);
}

#[test]
fn declined_confirmation_aborts_the_delete() {
    let mut host = ScriptHost {
        confirm_answers: VecDeque::from([false]),
        ..ScriptHost::default()
    };
    let source = FlakySource::new(people_source(), &[]);
    let mut panel = open_panel(source);
    let selected: Vec<RowId> = panel.items().to_vec();

    panel.delete_items(&mut host, &selected).unwrap();

    assert_eq!(panel.source().update_calls, 0);
    assert_eq!(panel.source().inner.len(), 3);
    assert!(!panel.has_pending_changes());
}

#[test]
fn delete_can_skip_confirmation_by_policy() {
    let mut host = ScriptHost {
        // Any confirmation request would consume from an empty queue and
        // answer true; assert below that none was requested.
        confirm_answers: VecDeque::new(),
        ..ScriptHost::default()
    };
    let mut panel = DataPanel::new(people_source())
        .with_columns(spec_columns())
        .with_options(PanelOptions::new().with_confirm_delete(false));
    panel.open().unwrap();
    let first = panel.items()[0];

    panel.delete_items(&mut host, &[first]).unwrap();
    assert_eq!(panel.source().len(), 2);
}

#[test]
fn deleting_a_vanished_row_just_drops_its_item() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(FlakySource::new(people_source(), &[]));
    let first = panel.items()[0];

    panel.delete_items(&mut host, &[first]).unwrap();
    assert_eq!(panel.source().update_calls, 1);

    // The handle no longer resolves; a second delete is a quiet no-op.
    panel.delete_items(&mut host, &[first]).unwrap();
    assert_eq!(panel.source().update_calls, 1);
    assert_eq!(panel.source().inner.len(), 2);
}

#[test]
fn conflicting_write_back_is_reported_not_raised() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());
    let first = panel.items()[0];

    panel
        .table_mut()
        .unwrap()
        .set_value(first, 1, Value::Text("dora".to_string()))
        .unwrap();
    // Concurrent writer touches the same stored row.
    panel
        .source_mut()
        .overwrite(0, 1, Value::Text("eve".to_string()))
        .unwrap();

    assert!(!panel.save(&mut host).unwrap());
    assert!(host.errors[0].contains("conflict"));
    assert_eq!(
        panel.table().unwrap().row(first).unwrap().state(),
        RowState::Modified
    );
    assert_eq!(
        panel.source().rows().next().unwrap()[1],
        Value::Text("eve".to_string())
    );
}

#[test]
fn delete_conflict_restores_the_row() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());
    let first = panel.items()[0];

    panel.source_mut().remove(0).unwrap();
    panel.delete_items(&mut host, &[first]).unwrap();

    assert_eq!(host.errors.len(), 1);
    assert_eq!(
        panel.table().unwrap().row(first).unwrap().state(),
        RowState::Unchanged
    );
    panel.update_items();
    assert!(panel.items().contains(&first));
}

#[test]
fn close_prompt_save_commits_before_closing() {
    let mut host = ScriptHost {
        save_choices: VecDeque::from([SaveChoice::Save]),
        ..ScriptHost::default()
    };
    let mut panel = open_panel(people_source());
    panel.create(&mut host).unwrap();

    assert!(panel.can_close(&mut host).unwrap());
    assert_eq!(panel.source().len(), 4);
    assert!(!panel.has_pending_changes());
}

#[test]
fn close_prompt_discard_rolls_back() {
    let mut host = ScriptHost {
        save_choices: VecDeque::from([SaveChoice::Discard]),
        ..ScriptHost::default()
    };
    let mut panel = open_panel(people_source());
    panel.create(&mut host).unwrap();

    assert!(panel.can_close(&mut host).unwrap());
    assert!(!panel.has_pending_changes());
    assert_eq!(panel.source().len(), 3);

    panel.update_items();
    assert_eq!(panel.items().len(), 3);
}

#[test]
fn close_prompt_cancel_denies_the_close() {
    let mut host = ScriptHost {
        save_choices: VecDeque::from([SaveChoice::Cancel]),
        ..ScriptHost::default()
    };
    let mut panel = open_panel(people_source());
    panel.create(&mut host).unwrap();

    assert!(!panel.can_close(&mut host).unwrap());
    assert!(panel.has_pending_changes());
}

#[test]
fn detail_close_check_covers_a_single_row() {
    let mut host = ScriptHost {
        save_choices: VecDeque::from([SaveChoice::Discard]),
        ..ScriptHost::default()
    };
    let mut panel = open_panel(people_source());
    let first = panel.items()[0];

    // Unchanged row: no prompt.
    assert!(panel.can_close_row(&mut host, first).unwrap());
    assert_eq!(host.prompts, 0);

    panel
        .table_mut()
        .unwrap()
        .set_value(first, 1, Value::Text("dora".to_string()))
        .unwrap();
    assert!(panel.can_close_row(&mut host, first).unwrap());
    assert_eq!(
        panel.table().unwrap().row(first).unwrap().value(1),
        Some(&Value::Text("alice".to_string()))
    );
}

#[test]
fn refresh_without_changes_refills_silently() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());
    panel
        .source_mut()
        .push(vec![Value::Int(4), Value::Text("dave".to_string())])
        .unwrap();

    panel.refresh(&mut host).unwrap();
    assert_eq!(panel.items().len(), 4);
    assert_eq!(host.prompts, 0);
    assert!(!panel.is_dirty());
}

#[test]
fn refresh_with_pending_changes_honors_cancel() {
    let mut host = ScriptHost {
        save_choices: VecDeque::from([SaveChoice::Cancel]),
        ..ScriptHost::default()
    };
    let mut panel = open_panel(people_source());
    let id = panel.create(&mut host).unwrap();

    panel.refresh(&mut host).unwrap();

    // No refill happened; the added row is still there.
    assert!(panel.has_pending_changes());
    assert!(panel.items().contains(&id));
    assert_eq!(panel.items().len(), 4);
}

#[test]
fn refresh_with_pending_changes_saves_then_refills() {
    let mut host = ScriptHost {
        save_choices: VecDeque::from([SaveChoice::Save]),
        ..ScriptHost::default()
    };
    let mut panel = open_panel(people_source());
    panel.create(&mut host).unwrap();

    panel.refresh(&mut host).unwrap();
    assert_eq!(panel.source().len(), 4);
    assert_eq!(panel.items().len(), 4);
    assert!(!panel.has_pending_changes());
}

#[test]
fn invalidate_drives_the_passive_refresh() {
    let mut panel = open_panel(people_source());
    panel.update_items();
    assert!(!panel.is_dirty());

    panel.invalidate();
    assert!(panel.is_dirty());
    panel.update_items();
    assert!(!panel.is_dirty());
}

#[test]
fn closed_offers_a_last_save_and_runs_the_hook() {
    let seen_rows = Rc::new(Cell::new(0usize));
    let hook_rows = seen_rows.clone();

    let mut host = ScriptHost {
        close_answers: VecDeque::from([true]),
        ..ScriptHost::default()
    };
    let mut panel = DataPanel::new(people_source())
        .with_columns(spec_columns())
        .on_closed(move |table| hook_rows.set(table.len()));
    panel.open().unwrap();
    panel.create(&mut host).unwrap();

    panel.closed(&mut host).unwrap();

    assert_eq!(panel.source().len(), 4);
    assert_eq!(seen_rows.get(), 4);
    assert!(!panel.is_open());
    assert!(panel.table().is_none());
    assert!(panel.items().is_empty());
}

#[test]
fn closed_without_changes_never_prompts() {
    let mut host = ScriptHost::default();
    let mut panel = open_panel(people_source());
    panel.closed(&mut host).unwrap();
    assert_eq!(host.prompts, 0);
    assert!(!panel.is_open());
}

#[test]
fn closed_can_let_the_changes_go() {
    let mut host = ScriptHost {
        close_answers: VecDeque::from([false]),
        ..ScriptHost::default()
    };
    let mut panel = open_panel(people_source());
    panel.create(&mut host).unwrap();

    panel.closed(&mut host).unwrap();
    assert_eq!(panel.source().len(), 3);
    assert!(!panel.is_open());
}

#[test]
fn items_project_through_the_role_map() {
    let panel = open_panel(people_source());
    let first = panel.items()[0];
    let item = panel.item(first).unwrap();
    assert_eq!(item.name(), "1");
    assert_eq!(item.owner(), "alice");
}
