//! Portal HTML builders for testing extraction and the pipeline.

/// One commodity's figure region in the portal's id-based markup.
/// `kind` is "electric" or "gas".
pub fn usage_region(kind: &str, usage: &str, unit: &str, cost: &str) -> String {
    format!(
        r#"<div id="{kind}-usage" class="usage-box {kind}">
            <span class="usage-label">Usage</span>
            <span class="usage-value">{usage}</span>
            <span class="usage-unit">{unit}</span>
            <span class="cost-label">Cost</span>
            <span class="cost-value">{cost}</span>
        </div>"#
    )
}

/// A full usage dashboard page wrapping the given regions.
pub fn usage_page(regions: &[String]) -> String {
    format!(
        r#"<html><body><main class="dashboard">{}</main></body></html>"#,
        regions.join("\n")
    )
}

/// A page with no ids or classes, figures only findable by label text.
pub fn label_adjacency_page(usage_line: &str, cost_line: &str) -> String {
    format!(
        r#"<html><body>
            <p>{usage_line}</p>
            <p>{cost_line}</p>
        </body></html>"#
    )
}

/// A page whose figures live in a script-embedded JSON blob.
pub fn script_json_page(json: &str) -> String {
    format!(
        r#"<html><body>
            <div class="spa-root"></div>
            <script>window.__USAGE__ = {json};</script>
        </body></html>"#
    )
}
