use serde_json::{json, Value};

use sheetwright_instructions::ChartArgs;

/// Builds the `batchUpdate` body for one `addChart` request from the
/// 7 positional chart arguments.
pub fn build_chart_request(args: &ChartArgs) -> Value {
    json!({
        "requests": [
            {
                "addChart": {
                    "chart": {
                        "spec": {
                            "title": args.title,
                            "basicChart": {
                                "chartType": args.chart_type,
                                "legendPosition": args.legend_position,
                                "axis": args.axis,
                                "domains": args.domains,
                                "series": args.series,
                            }
                        },
                        "position": args.position,
                    }
                }
            }
        ]
    })
}
