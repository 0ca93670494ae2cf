//! Handlers for `condmarket ids`.

use serde_json::json;

use super::command::{CollectionIdArgs, ConditionIdArgs, PositionIdArgs};
use super::output;
use crate::domain::{collection_id, condition_id, position_id, IndexSet, QuestionId};
use crate::error::Result;

/// Execute `ids condition`.
pub fn execute_condition(args: &ConditionIdArgs) -> Result<()> {
    let question = QuestionId::from_label(&args.question);
    let id = condition_id(args.oracle, question, args.outcomes);

    if output::is_json() {
        output::json_output(json!({
            "command": "ids.condition",
            "oracle": args.oracle,
            "question_id": question,
            "outcomes": args.outcomes,
            "condition_id": id,
        }));
        return Ok(());
    }

    output::section("Condition");
    output::field("Oracle", args.oracle);
    output::field("Question", question);
    output::field("Outcomes", args.outcomes);
    output::field("Id", output::highlight(id));
    Ok(())
}

/// Execute `ids collection`.
pub fn execute_collection(args: &CollectionIdArgs) -> Result<()> {
    let index_set = IndexSet::from(args.index_set);
    if index_set.is_empty() {
        output::warning("index set 0 selects no outcomes");
    }
    let id = collection_id(args.parent, args.condition, index_set);

    if output::is_json() {
        output::json_output(json!({
            "command": "ids.collection",
            "parent": args.parent,
            "condition_id": args.condition,
            "index_set": args.index_set,
            "collection_id": id,
        }));
        return Ok(());
    }

    output::section("Collection");
    output::field("Parent", args.parent);
    output::field("Condition", args.condition);
    output::field(
        "Outcomes",
        index_set
            .outcomes()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    );
    output::field("Id", output::highlight(id));
    Ok(())
}

/// Execute `ids position`.
pub fn execute_position(args: &PositionIdArgs) -> Result<()> {
    let id = position_id(args.collateral, args.collection);

    if output::is_json() {
        output::json_output(json!({
            "command": "ids.position",
            "collateral": args.collateral,
            "collection_id": args.collection,
            "position_id": id,
        }));
        return Ok(());
    }

    output::section("Position");
    output::field("Collateral", args.collateral);
    output::field("Collection", args.collection);
    output::field("Id", output::highlight(id));
    Ok(())
}
