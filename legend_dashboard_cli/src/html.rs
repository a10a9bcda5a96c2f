use liblegend_dashboard::view::{Page, PageSection, Widget, WidgetKind, GENERAL_INFORMATION};

const PAGE_TITLE: &str = "L200 Monitoring Dashboard";

const STYLE: &str = "
body{font-family:sans-serif;margin:0;color:#1A2A5B}
header{background:#f8f8fa;padding:8px 16px;font-weight:bold;font-size:20px}
nav a{margin-right:12px}
main{padding:12px 16px}
form{display:flex;flex-wrap:wrap;gap:12px;align-items:flex-start}
fieldset{border:1px solid #ccd;border-radius:4px}
.vertical label{display:block}
";

pub fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_widget(widget: &Widget) -> String {
    let key = widget.id.key();
    let mut html = format!(
        "<fieldset style=\"width:{}px\"><legend>{}</legend>",
        widget.width,
        escape(&widget.label)
    );
    match &widget.kind {
        WidgetKind::Select | WidgetKind::MenuButton => {
            html.push_str(&format!(
                "<select name=\"{key}\" onchange=\"this.form.submit()\">"
            ));
            for option in widget.options.iter() {
                let selected = if *option == widget.selected { " selected" } else { "" };
                html.push_str(&format!(
                    "<option value=\"{0}\"{selected}>{0}</option>",
                    escape(option)
                ));
            }
            html.push_str("</select>");
        }
        WidgetKind::RadioButtons { vertical } => {
            let class = if *vertical { "vertical" } else { "inline" };
            html.push_str(&format!("<div class=\"{class}\">"));
            for option in widget.options.iter() {
                let checked = if *option == widget.selected { " checked" } else { "" };
                html.push_str(&format!(
                    "<label><input type=\"radio\" name=\"{key}\" value=\"{0}\"{checked} \
                     onchange=\"this.form.submit()\">{0}</label>",
                    escape(option)
                ));
            }
            html.push_str("</div>");
        }
        WidgetKind::Slider { min, max, suffix } => {
            html.push_str(&format!(
                "<input type=\"range\" name=\"{key}\" min=\"{min}\" max=\"{max}\" value=\"{0}\" \
                 oninput=\"this.nextElementSibling.value=this.value+' {suffix}'\" \
                 onchange=\"this.form.submit()\"><output>{0} {suffix}</output>",
                escape(&widget.selected)
            ));
        }
    }
    html.push_str("</fieldset>");
    html
}

fn document(pages: &[Page], body: &str) -> String {
    let links: String = pages
        .iter()
        .map(|p| {
            let href = match p {
                Page::PhyMonitoring => "/",
                Page::Information => "/info",
            };
            format!("<a href=\"{href}\">{}</a>", p.title())
        })
        .collect();
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{PAGE_TITLE}</title><style>{STYLE}</style></head>\
         <body><header>{PAGE_TITLE}</header><nav>{links}</nav><main>{body}</main></body></html>"
    )
}

/// The physics monitoring page with the figure inlined as SVG
pub fn phy_page(pages: &[Page], section: &PageSection, svg: &str) -> String {
    let widgets: String = section.widgets.iter().map(render_widget).collect();
    let body = format!(
        "<h2>{}</h2><h3>Current Plot: {}</h3><form method=\"get\" action=\"/\">{widgets}</form>\
         <div class=\"plot\">{svg}</div>",
        escape(&section.name),
        escape(section.current_plot.trim_start_matches("## ")),
    );
    document(pages, &body)
}

/// The information page. The text is shown preformatted
pub fn info_page(pages: &[Page]) -> String {
    let body = format!(
        "<h2>{}</h2><pre style=\"white-space:pre-wrap\">{}</pre>",
        Page::Information.title(),
        escape(GENERAL_INFORMATION)
    );
    document(pages, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use liblegend_dashboard::figure::Figure;
    use liblegend_dashboard::view::WidgetId;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_phy_page() {
        let section = PageSection {
            name: String::from("Phy. Monitoring"),
            current_plot: String::from("## Noise"),
            widgets: vec![
                Widget {
                    id: WidgetId::Units,
                    label: String::from("Units"),
                    kind: WidgetKind::RadioButtons { vertical: false },
                    options: vec![String::from("Relative"), String::from("Absolute")],
                    selected: String::from("Absolute"),
                    width: 140,
                },
                Widget {
                    id: WidgetId::Resample,
                    label: String::from("Resampled"),
                    kind: WidgetKind::Slider { min: 0, max: 60, suffix: "min" },
                    options: vec![],
                    selected: String::from("30"),
                    width: 140,
                },
            ],
            figure: Figure::placeholder("t"),
        };
        let html = phy_page(&[Page::PhyMonitoring], &section, "<svg></svg>");
        assert!(html.contains("Current Plot: Noise"));
        assert!(html.contains("name=\"units\" value=\"Absolute\" checked"));
        assert!(html.contains("name=\"resampled\" min=\"0\" max=\"60\" value=\"30\""));
        assert!(html.contains("width:140px"));
        assert!(html.contains("<svg></svg>"));
        assert!(!html.contains("/info"));
    }
}
