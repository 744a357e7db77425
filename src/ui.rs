use crate::models::ReadingActivity;
use crate::timestamp::Timestamp;

/// Renders the recent-activity dashboard, or an error row when the view could
/// not be built.
pub fn render_index(rows: Result<&[ReadingActivity], &str>) -> String {
    let body = match rows {
        Ok([]) => message_row("No reading states found", "empty"),
        Ok(rows) => rows.iter().map(render_row).collect::<Vec<_>>().join("\n"),
        Err(message) => message_row(&format!("Error loading reading states: {message}"), "error"),
    };
    let count = rows.map(|rows| rows.len()).unwrap_or(0);

    INDEX_HTML
        .replace("{{COUNT}}", &count.to_string())
        .replace("{{ROWS}}", &body)
}

fn render_row(row: &ReadingActivity) -> String {
    let record = &row.record;
    format!(
        r#"        <tr>
          <td>{owner}</td>
          <td>{title}</td>
          <td>
            <div class="bar"><div class="fill" style="width: {percent:.1}%"></div></div>
            <span class="percent">{percent:.1}%</span>
            <div class="muted">Last read: {date}</div>
          </td>
          <td class="muted">page {page}</td>
        </tr>"#,
        owner = escape_html(&record.owner_display_name),
        title = escape_html(&row.book_title),
        percent = row.progress_percent,
        date = format_date(&record.last_read_at),
        page = record.current_page,
    )
}

fn message_row(message: &str, class: &str) -> String {
    format!(
        r#"        <tr><td colspan="4" class="{class}">{}</td></tr>"#,
        escape_html(message)
    )
}

fn format_date(at: &Timestamp) -> String {
    match at.instant() {
        Some(at) => at.format("%b %-d, %Y").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Reading Activity</title>
  <style>
    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      background: var(--card);
      border-radius: 24px;
      padding: 32px;
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      margin: 0;
      font-size: 2rem;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 10px 8px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    .bar {
      display: inline-block;
      width: 96px;
      height: 8px;
      background: #e6e0d6;
      border-radius: 999px;
      overflow: hidden;
      vertical-align: middle;
    }

    .fill {
      height: 100%;
      background: var(--accent-2);
    }

    .muted, .empty {
      color: #8b857d;
      font-size: 0.85rem;
    }

    .error {
      color: #b3261e;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    #status[data-type="error"] {
      color: #b3261e;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>Recent Reading Activity</h1>
        <p class="muted">{{COUNT}} most recent reading states</p>
      </div>
      <div>
        <button id="refresh" type="button">Refresh</button>
        <button id="repair" type="button">Repair records</button>
      </div>
    </header>
    <p id="status" class="muted"></p>
    <table>
      <thead>
        <tr><th>Reader</th><th>Book</th><th>Progress</th><th></th></tr>
      </thead>
      <tbody>
{{ROWS}}
      </tbody>
    </table>
  </main>
  <script>
    const statusEl = document.getElementById('status');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    document.getElementById('refresh').addEventListener('click', () => {
      window.location.reload();
    });

    document.getElementById('repair').addEventListener('click', async () => {
      setStatus('Repairing...', 'info');
      try {
        const res = await fetch('/api/reading/repair', { method: 'POST' });
        if (!res.ok) {
          throw new Error((await res.text()) || 'Repair failed');
        }
        const report = await res.json();
        setStatus(`Fixed ${report.totalFixed} record(s), ${report.totalErrors} error(s)`, 'ok');
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });
  </script>
</body>
</html>
"#;
