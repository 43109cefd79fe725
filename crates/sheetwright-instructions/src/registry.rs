use serde_json::{json, Value};
use sheetwright_ai::ToolDefinition;

use crate::InstructionKind;

/// Meta-tool used by the planner; not an instruction kind.
pub const GET_INSTRUCTIONS: &str = "get_instructions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One registry entry: the tool surface advertised to the model for a
/// given instruction kind, its ordered result fields, and the system
/// prompt used alongside it.
pub struct InstructionTool {
    pub name: &'static str,
    pub field_names: &'static [&'static str],
    pub description: &'static str,
    pub system_prompt: &'static str,
}

impl InstructionTool {
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: self.parameters(),
        }
    }

    pub fn parameters(&self) -> Value {
        match self.name {
            GET_INSTRUCTIONS => json!({
                "type": "object",
                "properties": {
                    "types": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "maxItems": 100,
                        "description": format!("One word instruction summary. Must be one of the following: READ, WRITE, CHART, QUESTION, OTHER, or INAPPROPRIATE.\n{KIND_SUMMARY}"),
                    },
                    "instructions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "maxItems": 100,
                        "description": "One sentence low-level instruction description",
                    }
                },
                "required": ["types", "instructions"],
            }),
            "write_table" => json!({
                "type": "object",
                "properties": {
                    "rows": {
                        "type": "array",
                        "items": { "type": "integer" },
                        "minItems": 1,
                        "maxItems": 100,
                        "description": "The 0-index rows of the values to update",
                    },
                    "columns": {
                        "type": "array",
                        "items": { "type": "integer" },
                        "minItems": 1,
                        "maxItems": 100,
                        "description": "The 0-index columns of the values to update",
                    },
                    "values": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "maxItems": 100,
                        "description": "The values to update at the rows and columns",
                    }
                },
                "required": ["rows", "columns", "values"],
            }),
            "read_table" => json!({
                "type": "object",
                "properties": {
                    "rows": {
                        "type": "array",
                        "items": { "type": "integer" },
                        "minItems": 1,
                        "maxItems": 100,
                        "description": "The 0-index rows of the values to get",
                    },
                    "columns": {
                        "type": "array",
                        "items": { "type": "integer" },
                        "minItems": 1,
                        "maxItems": 100,
                        "description": "The 0-index columns of the values to get",
                    }
                },
                "required": ["rows", "columns"],
            }),
            "create_chart" => json!({
                "type": "object",
                "properties": {
                    "arguments": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 7,
                        "maxItems": 7,
                        "description": "A list of 7 argument values for creating a basic chart using the Google Sheets Add Chart Request API. The arguments are: title (string), chartType (BasicChartType), legendPosition (BasicChartLegendPosition), axis (BasicChartAxis), domains (BasicChartDomain), series (BasicChartSeries), position (EmbeddedObjectPosition)",
                    }
                },
                "required": ["arguments"],
            }),
            "answer_question" => json!({
                "type": "object",
                "properties": {
                    "answer": {
                        "type": "string",
                        "description": "The answer to question about Google Sheets",
                    }
                },
                "required": ["answer"],
            }),
            "other_instruction" => json!({
                "type": "object",
                "properties": {
                    "body": {
                        "type": "string",
                        "description": "The stringified JSON body to call the Google Spreadsheets spreadsheets.batchUpdate() API with as the body argument",
                    }
                },
                "required": ["body"],
            }),
            other => unreachable!("unknown registry tool {other}"),
        }
    }
}

const KIND_SUMMARY: &str = "\
READ involves only reading/getting cell values. READ is only used when the user specifically requests data in the sheet. Never READ just to prepare a write.
WRITE involves changing and inserting cell values. WRITE also implicitly reads and does not need to explicitly read values in.
CHART involves creating only a basic chart (BAR, LINE, AREA, COLUMN, SCATTER, COMBO, or STEPPED_AREA). CHART also implicitly reads and does not need to explicitly read values in.
QUESTION involves only questions about Sheets that do not require READ, WRITE, or CHART operations.
OTHER involves Sheets operations that do not fit into READ, WRITE, CHART, or QUESTION operations, such as creating pivot tables or charts not listed in the CHART category (ex: pie chart).
INAPPROPRIATE involves questions that are not relevant to Google Sheets at all.";

static GET_INSTRUCTIONS_TOOL: InstructionTool = InstructionTool {
    name: GET_INSTRUCTIONS,
    field_names: &["types", "instructions"],
    description: "Returns a list of lower level instructions consisting of read, write, chart, question, or other instructions.",
    system_prompt: "You are an expert assistant using Google Sheets.
Given new-line separated, potentially high-level tasks, return the function call to break down the tasks into lower level instructions and their corresponding instruction types.
Each index of the returned lists correspond, so both the arrays will have the same length.
The instruction types are READ, WRITE, CHART, QUESTION, OTHER, or INAPPROPRIATE.
READ involves only reading/getting cell values. READ is only used when the user specifically requests data in the sheet. Never READ just to prepare a write.
WRITE involves changing and inserting cell values. WRITE also implicitly reads and does not need to explicitly read values in.
CHART involves creating only a basic chart (BAR, LINE, AREA, COLUMN, SCATTER, COMBO, or STEPPED_AREA). CHART also implicitly reads and does not need to explicitly read values in.
QUESTION involves only questions about Sheets that do not require READ, WRITE, or CHART operations.
OTHER involves operations that do not fit into READ, WRITE, CHART or QUESTION operations, such as creating pivot tables or charts not listed in the CHART category (ex: pie chart).
INAPPROPRIATE involves questions that are not relevant to Google Sheets at all.",
};

static WRITE_TABLE_TOOL: InstructionTool = InstructionTool {
    name: "write_table",
    field_names: &["rows", "columns", "values"],
    description: "Set the value in the cell to be the given value",
    system_prompt: "You are an expert assistant using Google Sheets.
Given a table representation and new-line separated instructions to update values inside cells, return the function call to complete the updates as if the table is a Google Sheets.
Each index of the returned lists should correspond to each instruction, so all the arrays should have the same length.
If a Google Sheets formula can be used, always prefer the formula over hard-coding values.",
};

static READ_TABLE_TOOL: InstructionTool = InstructionTool {
    name: "read_table",
    field_names: &["rows", "columns"],
    description: "Get the values of given cells in the table",
    system_prompt: "You are an expert assistant using Google Sheets.
Given a table representation and new-line separated instructions to get values inside cells, return the function call to complete the get calls as if the table is a Google Sheets.
Each index of the returned lists correspond, so both the arrays will have the same length.",
};

static CREATE_CHART_TOOL: InstructionTool = InstructionTool {
    name: "create_chart",
    field_names: &["arguments"],
    description: "Creates chart",
    system_prompt: "You are an expert assistant using Google Sheets.
Given a table representation and a create basic chart operation to be executed via the spreadsheets batchUpdate() API endpoint, return the list of exactly 7 specified arguments from the Google Sheets Add Chart Request API.
Use the Google Sheets documentation to return the exact value and type needed for the API request.
By default, create charts in an overlayed position of the same sheet that does not cover the cells with values, unless the user specifies otherwise.
chartType is an enum string value and can be BAR, LINE, AREA, COLUMN, SCATTER, COMBO, or STEPPED_AREA.
legendPosition is an enum string value and can be BOTTOM_LEGEND, LEFT_LEGEND, RIGHT_LEGEND, TOP_LEGEND, or NO_LEGEND.
axis is a JSON array of objects with position and title fields.
domains is a JSON array of objects whose domain.sourceRange.sources entries carry sheetId, startRowIndex, endRowIndex, startColumnIndex, and endColumnIndex.
series is a JSON array of objects whose series.sourceRange.sources entries carry the same index fields, plus targetAxis and an optional color.
position is a JSON object with an overlayPosition carrying anchorCell (sheetId, rowIndex, columnIndex), offsetXPixels, offsetYPixels, widthPixels, and heightPixels.",
};

static ANSWER_QUESTION_TOOL: InstructionTool = InstructionTool {
    name: "answer_question",
    field_names: &["answer"],
    description: "Answer question about Google Sheets",
    system_prompt: "You are an expert assistant using Google Sheets.
Given a table representation and a question regarding Google Sheets, return the function call to answer the question as if the table is a Google Sheets.",
};

static OTHER_INSTRUCTION_TOOL: InstructionTool = InstructionTool {
    name: "other_instruction",
    field_names: &["body"],
    description: "Executes the Google Spreadsheets spreadsheets.batchUpdate() API endpoint with the given request body",
    system_prompt: "You are an expert assistant using Google Sheets.
Given a table representation and an operation to be executed via the spreadsheets batchUpdate() API endpoint, return the request body to complete the requested operation as if the table is a Google Sheets sheet.",
};

/// Looks up the registry entry for a tool name, including the
/// planner's `get_instructions` meta-tool.
pub fn tool_for_name(name: &str) -> Option<&'static InstructionTool> {
    match name {
        GET_INSTRUCTIONS => Some(&GET_INSTRUCTIONS_TOOL),
        "write_table" => Some(&WRITE_TABLE_TOOL),
        "read_table" => Some(&READ_TABLE_TOOL),
        "create_chart" => Some(&CREATE_CHART_TOOL),
        "answer_question" => Some(&ANSWER_QUESTION_TOOL),
        "other_instruction" => Some(&OTHER_INSTRUCTION_TOOL),
        _ => None,
    }
}

/// Looks up the registry entry for an instruction kind.
/// `Inappropriate` has no tool and returns `None`.
pub fn tool_for_kind(kind: InstructionKind) -> Option<&'static InstructionTool> {
    kind.tool_name().and_then(tool_for_name)
}
