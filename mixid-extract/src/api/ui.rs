//! UI Routes - HTML page for the mixid web interface
//!
//! Vanilla HTML/CSS/JS: submits a job, follows it over SSE, renders the
//! tracklist.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(root_page))
}

/// Root page - submit a mix and watch it being identified
async fn root_page() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>mixid - Tracklist Extractor</title>
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            max-width: 900px;
            margin: 40px auto;
            padding: 20px;
            line-height: 1.6;
        }
        h1 {
            color: #333;
            border-bottom: 2px solid #ff5500;
            padding-bottom: 10px;
        }
        input[type=text] { width: 70%; padding: 8px; }
        input[type=number] { width: 70px; padding: 8px; }
        button {
            padding: 8px 20px;
            background: #ff5500;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }
        button:disabled { background: #aaa; cursor: default; }
        .progress-bar {
            width: 100%;
            height: 22px;
            background: #eee;
            border-radius: 4px;
            overflow: hidden;
            margin: 15px 0 5px;
        }
        .progress-fill {
            height: 100%;
            width: 0%;
            background: #ff5500;
            transition: width 0.3s;
        }
        #status { color: #555; }
        .error { color: #c00; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; }
        th, td { text-align: left; padding: 6px; border-bottom: 1px solid #ddd; }
        tr.not-ok td { color: #999; }
    </style>
</head>
<body>
    <h1>mixid - Tracklist Extractor</h1>
    <p>Paste the URL of a DJ mix. It is cut into chunks, every chunk is identified,
       and consecutive chunks of the same track are merged into one entry.</p>

    <form id="extract-form">
        <input type="text" id="source-url" placeholder="https://soundcloud.com/artist/mix" required>
        <input type="number" id="chunk-duration" value="10" min="1" title="Chunk duration (seconds)">
        <button type="submit" id="submit">Extract</button>
    </form>

    <div class="progress-bar"><div class="progress-fill" id="progress"></div></div>
    <div id="status"></div>
    <div id="output"></div>

    <script>
        const form = document.getElementById('extract-form');
        const submit = document.getElementById('submit');
        const progress = document.getElementById('progress');
        const statusLine = document.getElementById('status');
        const output = document.getElementById('output');

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text == null ? '' : String(text);
            return div.innerHTML;
        }

        function formatTime(seconds) {
            const m = Math.floor(seconds / 60);
            const s = seconds % 60;
            return m + ':' + String(s).padStart(2, '0');
        }

        function renderTracklist(tracklist, location) {
            let html = '<table><tr><th>#</th><th>Time</th><th>Artist</th><th>Title</th><th>Status</th><th>Link</th></tr>';
            for (const t of tracklist) {
                const link = t.external_link
                    ? '<a href="' + escapeHtml(t.external_link) + '" target="_blank">watch</a>'
                    : '';
                html += '<tr class="' + (t.status === 'ok' ? '' : 'not-ok') + '">'
                    + '<td>' + t.order + '</td>'
                    + '<td>' + formatTime(t.chunk_seconds[0]) + ' - ' + formatTime(t.chunk_seconds[1]) + '</td>'
                    + '<td>' + escapeHtml(t.artist) + '</td>'
                    + '<td>' + escapeHtml(t.title) + '</td>'
                    + '<td>' + escapeHtml(t.error ? t.status + ': ' + t.error : t.status) + '</td>'
                    + '<td>' + link + '</td></tr>';
            }
            html += '</table><p><small>Saved to ' + escapeHtml(location) + '</small></p>';
            output.innerHTML = html;
        }

        function follow(jobId) {
            const source = new EventSource('/jobs/' + jobId + '/events');

            source.addEventListener('JobProgress', (e) => {
                const data = JSON.parse(e.data);
                progress.style.width = data.progress + '%';
                statusLine.textContent = data.message;
            });

            source.addEventListener('JobCompleted', (e) => {
                const data = JSON.parse(e.data);
                progress.style.width = '100%';
                renderTracklist(data.tracklist, data.output_location);
                source.close();
                submit.disabled = false;
            });

            source.addEventListener('JobFailed', (e) => {
                const data = JSON.parse(e.data);
                statusLine.innerHTML = '<span class="error">' + escapeHtml(data.error) + '</span>';
                source.close();
                submit.disabled = false;
            });

            source.onerror = async () => {
                source.close();
                submit.disabled = false;
                let message = 'Lost connection to job ' + jobId;
                try {
                    const response = await fetch('/jobs/' + jobId);
                    const body = await response.json();
                    if (body.error && body.error.message) {
                        message = body.error.message;
                    } else if (typeof body.error === 'string') {
                        message = body.error;
                    }
                } catch (_) {
                    // keep the connection message
                }
                statusLine.innerHTML = '<span class="error">' + escapeHtml(message) + '</span>';
            };
        }

        form.addEventListener('submit', async (e) => {
            e.preventDefault();
            submit.disabled = true;
            output.innerHTML = '';
            progress.style.width = '0%';
            statusLine.textContent = 'Submitting...';

            const response = await fetch('/extract', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({
                    source_url: document.getElementById('source-url').value,
                    chunk_duration: parseInt(document.getElementById('chunk-duration').value, 10) || 10,
                }),
            });
            const body = await response.json();

            if (!response.ok) {
                statusLine.innerHTML = '<span class="error">' + escapeHtml(body.error.message) + '</span>';
                submit.disabled = false;
                return;
            }
            follow(body.job_id);
        });
    </script>
</body>
</html>
        "#,
    )
}
