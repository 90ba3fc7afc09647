//! Preview document
//!
//! [`build_preview_document`] is a pure function from a bundle to the full
//! HTML text of the preview page: pinned runtime scripts, the execution
//! scope, the bundle and the mount call. Uncaught failures inside the page
//! are shown in place of the app and posted to the host window.

use balbal_conf::PreviewSettings;
use balbal_core::{Bundle, OutputFormat};
use balbal_report::escape_html;

use crate::scope::{ExecutionScope, js_string};

/// `type` of the message a preview page posts to its host on failure
pub const PREVIEW_ERROR_MESSAGE: &str = "balbal:preview-error";

const BASE_STYLE: &str =
	"html, body, #root { height: 100%; margin: 0; }\nbody { font-family: system-ui, sans-serif; }";

/// Build the preview page for `bundle`
pub fn build_preview_document(
	bundle: &Bundle,
	settings: &PreviewSettings,
	scope: &ExecutionScope,
) -> String {
	let module = bundle.format == OutputFormat::Esm;
	let mut html = String::with_capacity(bundle.code.len() + scope.prelude().len() + 4096);

	html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
	html.push_str("<meta charset=\"UTF-8\" />\n");
	html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
	html.push_str(&format!("<title>{}</title>\n", escape_html(&settings.title)));
	html.push_str(&external_script(&settings.react_url));
	html.push_str(&external_script(&settings.react_dom_url));
	if let Some(tailwind) = &settings.tailwind_url {
		html.push_str(&external_script(tailwind));
	}
	html.push_str(&format!("<style>\n{}\n</style>\n", BASE_STYLE));
	html.push_str("</head>\n<body>\n");
	html.push_str(&format!(
		"<div id=\"{}\"></div>\n",
		escape_html(&settings.mount_element_id)
	));
	html.push_str(&inline_script(&error_forwarding_script(&settings.mount_element_id), false));
	html.push_str(&inline_script(&scope.prelude(), false));
	html.push_str(&inline_script(&bundle.code, module));
	html.push_str(&inline_script(
		&format!(
			"try {{\n{}}} catch (error) {{\n\twindow.__balbal_report(error);\n}}\n",
			scope.mount_script()
		),
		module,
	));
	html.push_str("</body>\n</html>\n");
	html
}

fn external_script(src: &str) -> String {
	format!(
		"<script crossorigin src=\"{}\"></script>\n",
		escape_html(src)
	)
}

fn inline_script(code: &str, module: bool) -> String {
	let open = if module {
		"<script type=\"module\">"
	} else {
		"<script>"
	};
	format!("{}\n{}\n</script>\n", open, escape_inline_script(code))
}

/// Keep `code` from closing its `<script>` element early
pub fn escape_inline_script(code: &str) -> String {
	let lower = code.to_ascii_lowercase();
	let mut out = String::with_capacity(code.len());
	let mut last = 0;
	for (idx, _) in lower.match_indices("</script") {
		out.push_str(&code[last..idx]);
		out.push_str("<\\/");
		last = idx + 2;
	}
	out.push_str(&code[last..]);
	out.replace("<!--", "<\\!--")
}

fn error_forwarding_script(mount_element_id: &str) -> String {
	format!(
		r#"(function () {{
	function describe(error) {{
		if (error && typeof error === "object") {{
			return {{
				name: error.name ? String(error.name) : "Error",
				message: error.message !== undefined ? String(error.message) : String(error),
				stack: error.stack ? String(error.stack) : null
			}};
		}}
		return {{ name: "Error", message: String(error), stack: null }};
	}}
	function show(details) {{
		var root = document.getElementById({mount});
		if (!root) {{
			return;
		}}
		var pre = document.createElement("pre");
		pre.style.cssText = "color: salmon; white-space: pre-wrap; padding: 16px; margin: 0;";
		pre.textContent = details.name + ": " + details.message;
		root.innerHTML = "";
		root.appendChild(pre);
	}}
	window.__balbal_report = function (error) {{
		var details = describe(error);
		show(details);
		if (window.parent && window.parent !== window) {{
			window.parent.postMessage({{ type: {message}, error: details }}, "*");
		}}
	}};
	window.addEventListener("error", function (event) {{
		window.__balbal_report(event.error || {{ name: "Error", message: event.message }});
	}});
	window.addEventListener("unhandledrejection", function (event) {{
		window.__balbal_report(event.reason);
	}});
}})();"#,
		mount = js_string(mount_element_id),
		message = js_string(PREVIEW_ERROR_MESSAGE),
	)
}
