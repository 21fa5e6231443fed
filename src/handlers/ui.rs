use axum::{response::Html, routing::get, Router};

pub fn ui_routes() -> Router {
    Router::new().route("/", get(chat_page))
}

pub async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

const CHAT_PAGE: &str = r###"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>🎓 UniAssist - University Admission Assistant</title>
    <script src="https://cdn.jsdelivr.net/npm/marked/marked.min.js"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        :root {
            --bg: #f8fafc;
            --panel: #ffffff;
            --text: #1f2937;
            --muted: #64748b;
            --user: #2563eb;
            --bot: #eef2ff;
            --border: #e2e8f0;
        }
        body.dark {
            --bg: #0f172a;
            --panel: #1e293b;
            --text: #e2e8f0;
            --muted: #94a3b8;
            --user: #3b82f6;
            --bot: #334155;
            --border: #334155;
        }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg);
            color: var(--text);
            display: flex;
            height: 100vh;
            transition: background 0.3s ease;
        }
        aside {
            width: 300px;
            background: var(--panel);
            border-right: 1px solid var(--border);
            padding: 1.5rem;
            overflow-y: auto;
        }
        aside h2 { font-size: 1.1rem; margin-bottom: 1rem; }
        .example {
            display: block;
            width: 100%;
            text-align: left;
            background: transparent;
            color: var(--text);
            border: 1px solid var(--border);
            border-radius: 8px;
            padding: 0.6rem;
            margin-bottom: 0.5rem;
            cursor: pointer;
        }
        .example:hover { border-color: var(--user); }
        main { flex: 1; display: flex; flex-direction: column; }
        .topbar {
            display: flex;
            justify-content: space-between;
            align-items: center;
            padding: 1rem 1.5rem;
            border-bottom: 1px solid var(--border);
            background: var(--panel);
        }
        #messages { flex: 1; overflow-y: auto; padding: 1.5rem; }
        .bubble {
            max-width: 75%;
            padding: 0.8rem 1rem;
            border-radius: 12px;
            margin-bottom: 0.4rem;
            line-height: 1.5;
        }
        .row { display: flex; flex-direction: column; margin-bottom: 1rem; }
        .row.user { align-items: flex-end; }
        .row.user .bubble { background: var(--user); color: white; }
        .row.bot .bubble { background: var(--bot); }
        .meta { font-size: 0.75rem; color: var(--muted); display: flex; gap: 0.5rem; align-items: center; }
        .meta button { background: none; border: none; cursor: pointer; font-size: 0.9rem; }
        .notice { color: #b45309; font-size: 0.8rem; }
        form {
            display: flex;
            gap: 0.5rem;
            padding: 1rem 1.5rem;
            border-top: 1px solid var(--border);
            background: var(--panel);
        }
        #question {
            flex: 1;
            padding: 0.8rem;
            border-radius: 8px;
            border: 1px solid var(--border);
            background: var(--bg);
            color: var(--text);
        }
        form button, .topbar button {
            border: none;
            border-radius: 8px;
            padding: 0.6rem 1rem;
            background: var(--user);
            color: white;
            cursor: pointer;
        }
        #micButton.recording { background: #dc2626; }
        .error { color: #dc2626; padding: 0 1.5rem; min-height: 1.2rem; font-size: 0.85rem; }
    </style>
</head>
<body>
    <aside>
        <h2>💡 Example Questions</h2>
        <div id="examples"></div>
    </aside>
    <main>
        <div class="topbar">
            <h1>🎓 University Admission Assistant</h1>
            <button id="themeButton" onclick="toggleTheme()">🌙 Dark mode</button>
        </div>
        <div id="messages"></div>
        <div id="error" class="error"></div>
        <form onsubmit="sendMessage(event)">
            <input id="question" placeholder="Ask about courses, fees, subjects..." autocomplete="off">
            <button type="button" id="micButton" onclick="toggleRecording()">🎤</button>
            <button type="submit" id="sendButton">Send</button>
        </form>
    </main>

    <script>
        const SESSION_KEY = 'uniassist_session_id';
        let activeSpeech = null;
        let recorder = null;
        let chunks = [];
        let draftTimer = null;

        function sessionHeaders(extra) {
            const headers = Object.assign({}, extra || {});
            const id = sessionStorage.getItem(SESSION_KEY);
            if (id) headers['X-Session-Id'] = id;
            return headers;
        }

        function remember(sessionId) {
            if (sessionId) sessionStorage.setItem(SESSION_KEY, sessionId);
        }

        function showError(text) {
            document.getElementById('error').textContent = text || '';
        }

        function render(markdown) {
            return window.marked ? marked.parse(markdown) : markdown.replace(/</g, '&lt;');
        }

        function addMessage(role, text, timestamp, notice) {
            const row = document.createElement('div');
            row.className = 'row ' + role;
            const bubble = document.createElement('div');
            bubble.className = 'bubble';
            if (role === 'bot') bubble.innerHTML = render(text); else bubble.textContent = text;
            row.appendChild(bubble);

            const meta = document.createElement('div');
            meta.className = 'meta';
            meta.textContent = timestamp || '';
            if (role === 'bot') {
                const speak = document.createElement('button');
                speak.title = 'Read aloud';
                speak.textContent = '🔊';
                speak.onclick = () => speakText(text, speak);
                meta.appendChild(speak);
            }
            row.appendChild(meta);

            if (notice) {
                const note = document.createElement('div');
                note.className = 'notice';
                note.textContent = notice;
                row.appendChild(note);
            }
            const messages = document.getElementById('messages');
            messages.appendChild(row);
            messages.scrollTop = messages.scrollHeight;
        }

        function applyTheme(dark) {
            document.body.classList.toggle('dark', dark);
            document.getElementById('themeButton').textContent = dark ? '☀️ Light mode' : '🌙 Dark mode';
        }

        async function loadSession() {
            const response = await fetch('/api/session', { headers: sessionHeaders() });
            const data = await response.json();
            const session = data.session;
            remember(session.session_id);
            applyTheme(session.dark_mode);
            document.getElementById('question').value = session.draft_question;

            const examples = document.getElementById('examples');
            examples.innerHTML = '';
            for (const question of session.example_questions) {
                const button = document.createElement('button');
                button.className = 'example';
                button.textContent = question;
                button.onclick = () => useExample(question);
                examples.appendChild(button);
            }

            if (session.history.length === 0) {
                addMessage('bot', "👋 Hello! I'm your university admission assistant. Ask me anything about our courses.");
            }
            for (const entry of session.history) {
                addMessage('user', entry.user_message, entry.timestamp);
                addMessage('bot', entry.reply, entry.timestamp);
            }
        }

        async function saveDraft(question) {
            const response = await fetch('/api/session/draft', {
                method: 'POST',
                headers: sessionHeaders({ 'Content-Type': 'application/json' }),
                body: JSON.stringify({ question })
            });
            const data = await response.json();
            remember(data.session_id);
        }

        function useExample(question) {
            document.getElementById('question').value = question;
            saveDraft(question);
            document.getElementById('question').focus();
        }

        async function toggleTheme() {
            const response = await fetch('/api/session/theme', {
                method: 'POST',
                headers: sessionHeaders({ 'Content-Type': 'application/json' }),
                body: JSON.stringify({})
            });
            const data = await response.json();
            remember(data.session_id);
            applyTheme(data.dark_mode);
        }

        async function sendMessage(event) {
            event.preventDefault();
            const input = document.getElementById('question');
            const message = input.value.trim();
            if (!message) {
                showError('Please enter a question');
                return;
            }
            showError('');
            input.value = '';
            addMessage('user', message);
            const send = document.getElementById('sendButton');
            send.disabled = true;
            send.textContent = 'Thinking...';

            try {
                const response = await fetch('/api/chat', {
                    method: 'POST',
                    headers: sessionHeaders({ 'Content-Type': 'application/json' }),
                    body: JSON.stringify({ message })
                });
                const data = await response.json();
                if (data.success) {
                    remember(data.session_id);
                    addMessage('bot', data.reply, data.timestamp, data.notice);
                } else {
                    showError(data.message);
                }
            } catch (e) {
                showError('Network error. Please try again.');
            } finally {
                send.disabled = false;
                send.textContent = 'Send';
            }
        }

        async function stopSpeech() {
            if (!activeSpeech) return;
            const { jobId, audio } = activeSpeech;
            activeSpeech = null;
            if (audio) audio.pause();
            await fetch('/api/speech/' + jobId, { method: 'DELETE' });
        }

        async function speakText(text, button) {
            await stopSpeech();
            const response = await fetch('/api/speech', {
                method: 'POST',
                headers: sessionHeaders({ 'Content-Type': 'application/json' }),
                body: JSON.stringify({ text })
            });
            const data = await response.json();
            if (!data.success) { showError(data.message); return; }
            const current = { jobId: data.job_id, audio: null };
            activeSpeech = current;
            button.textContent = '⏳';

            while (activeSpeech === current) {
                await new Promise(resolve => setTimeout(resolve, 700));
                const status = await (await fetch('/api/speech/' + current.jobId)).json();
                if (status.status === 'pending') continue;
                if (status.status === 'ready' && activeSpeech === current) {
                    current.audio = new Audio('/api/speech/' + current.jobId + '/audio');
                    current.audio.onended = () => { if (activeSpeech === current) activeSpeech = null; button.textContent = '🔊'; };
                    button.textContent = '⏹️';
                    button.onclick = () => { stopSpeech(); button.textContent = '🔊'; button.onclick = () => speakText(text, button); };
                    current.audio.play();
                    return;
                }
                if (status.status === 'failed') showError('Could not generate speech. Please try again.');
                break;
            }
            button.textContent = '🔊';
        }

        async function toggleRecording() {
            const mic = document.getElementById('micButton');
            if (recorder && recorder.state === 'recording') {
                recorder.stop();
                return;
            }
            try {
                const stream = await navigator.mediaDevices.getUserMedia({ audio: true });
                recorder = new MediaRecorder(stream);
                chunks = [];
                recorder.ondataavailable = e => chunks.push(e.data);
                recorder.onstop = async () => {
                    mic.classList.remove('recording');
                    stream.getTracks().forEach(t => t.stop());
                    const blob = new Blob(chunks, { type: recorder.mimeType || 'audio/webm' });
                    const response = await fetch('/api/speech/transcribe', {
                        method: 'POST',
                        headers: { 'Content-Type': blob.type.split(';')[0] },
                        body: blob
                    });
                    const data = await response.json();
                    if (data.success) {
                        document.getElementById('question').value = data.text;
                        saveDraft(data.text);
                    } else {
                        showError(data.message);
                    }
                };
                recorder.start();
                mic.classList.add('recording');
            } catch (e) {
                showError('Microphone access is not available.');
            }
        }

        document.getElementById('question').addEventListener('input', e => {
            clearTimeout(draftTimer);
            draftTimer = setTimeout(() => saveDraft(e.target.value), 500);
        });

        loadSession().catch(() => showError('Could not reach the server.'));
    </script>
</body>
</html>
"###;
