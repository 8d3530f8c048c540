use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Docsift - Document Text Extraction</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem; color: #1d1d1f; max-width: 960px; }
    h1 { margin-bottom: 0.5rem; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    label { display: block; margin-top: 0.75rem; font-weight: 600; }
    textarea { width: 100%; padding: 0.5rem; }
    button { margin-top: 1rem; padding: 0.6rem 1rem; }
    pre { background: #f6f8fa; padding: 1rem; overflow: auto; white-space: pre-wrap; }
    .error { color: #b00020; }
  </style>
</head>
<body>
  <h1>Docsift</h1>
  <p>Upload a PDF, Word, text, CSV, Excel, PowerPoint or HTML file to get its plain text.</p>

  <div class="card">
    <h2>1) Extract text</h2>
    <input id="fileInput" type="file" />
    <button id="extractBtn">Extract</button>
    <div id="extractStatus"></div>
    <pre id="documentText"></pre>
  </div>

  <div class="card">
    <h2>2) Ask about the document</h2>
    <label>Question</label>
    <textarea id="question" rows="3" placeholder="What is this document about?"></textarea>
    <button id="askBtn">Ask</button>
    <pre id="answer"></pre>
  </div>

  <script>
    const extractBtn = document.getElementById('extractBtn');
    const askBtn = document.getElementById('askBtn');
    const extractStatus = document.getElementById('extractStatus');
    const documentText = document.getElementById('documentText');
    const answer = document.getElementById('answer');

    extractBtn.addEventListener('click', async () => {
      const fileInput = document.getElementById('fileInput');
      if (!fileInput.files.length) {
        extractStatus.textContent = 'Select a file first.';
        return;
      }
      const formData = new FormData();
      formData.append('file', fileInput.files[0]);
      extractStatus.textContent = 'Extracting...';
      documentText.textContent = '';
      const res = await fetch('/extract-text/', { method: 'POST', body: formData });
      const json = await res.json();
      if (json.text !== undefined) {
        extractStatus.textContent = 'Done.';
        extractStatus.className = '';
        documentText.textContent = json.text;
      } else {
        extractStatus.textContent = json.error || json.detail || 'Extraction failed.';
        extractStatus.className = 'error';
      }
    });

    askBtn.addEventListener('click', async () => {
      const question = document.getElementById('question').value.trim();
      if (!documentText.textContent) {
        answer.textContent = 'Extract a document first.';
        return;
      }
      if (!question) {
        answer.textContent = 'Type a question.';
        return;
      }
      answer.textContent = 'Thinking...';
      const res = await fetch('/chat/', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ documentText: documentText.textContent, userMessage: question })
      });
      const json = await res.json();
      answer.textContent = json.answer !== undefined ? json.answer : (json.error || JSON.stringify(json));
    });
  </script>
</body>
</html>"#)
}
