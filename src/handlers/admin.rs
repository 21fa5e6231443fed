// src/handlers/admin.rs
use crate::error::AppError;
use crate::middleware::admin::admin_session_middleware;
use crate::models::admin::{AdminIdentity, DateRangeQuery};
use crate::models::catalog::Catalog;
use crate::services::analytics::{self, DateRange};
use crate::services::export::{self, EXPORT_FILENAME};
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    http::header,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

pub fn admin_routes() -> Router {
    let pages = Router::new().route("/admin", get(admin_page));

    let api = Router::new()
        .route("/api/admin/stats", get(admin_stats_api))
        .route("/api/admin/chats", get(chat_history_api))
        .route("/api/admin/chats/export", get(export_chats))
        .route("/api/admin/courses", get(get_courses).put(update_courses))
        .route_layer(axum::middleware::from_fn(admin_session_middleware));

    pages.merge(api)
}

pub async fn admin_stats_api(Extension(state): Extension<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let sessions = state.store.user_sessions().await?;
    let inquiries = state.store.course_inquiry_counts().await?;

    Ok(Json(json!({
        "success": true,
        "user_stats": analytics::user_stats(&sessions, Utc::now(), &state.timezone),
        "course_inquiries": analytics::course_inquiry_stats(inquiries),
    })))
}

fn resolve_range(state: &AppState, query: &DateRangeQuery) -> Result<DateRange, AppError> {
    let range = DateRange::resolve(query.start, query.end, Utc::now(), &state.timezone);
    if !range.is_valid() {
        return Err(AppError::BadRequest("Start date must not be after end date".to_string()));
    }
    Ok(range)
}

pub async fn chat_history_api(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let range = resolve_range(&state, &query)?;
    let (start, end) = range.utc_bounds(&state.timezone);
    let records = state.store.chat_records_between(start, end).await?;

    Ok(Json(json!({
        "success": true,
        "start": range.start,
        "end": range.end,
        "metrics": analytics::chat_metrics(&records, &state.timezone),
        "recent": analytics::recent_conversations(&records),
    })))
}

pub async fn export_chats(
    Extension(state): Extension<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, AppError> {
    let range = resolve_range(&state, &query)?;
    let (start, end) = range.utc_bounds(&state.timezone);
    let records = state.store.chat_records_between(start, end).await?;

    let csv = export::chat_history_csv(&records, &state.timezone).map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(
        "📤 Admin '{}' exported {} chats ({} to {})",
        admin.username,
        records.len(),
        range.start,
        range.end
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn get_courses(Extension(state): Extension<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = state.store.load_catalog().await?;

    Ok(Json(json!({
        "success": true,
        "courses": catalog,
        "editor_text": catalog.to_pretty_json(),
    })))
}

/// Replace the catalog with the raw JSON body. Anything that fails to parse
/// or validate is rejected and the stored catalog is left alone.
pub async fn update_courses(
    Extension(state): Extension<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = Catalog::parse(&body).map_err(|e| {
        tracing::warn!("Admin '{}' submitted invalid course data: {}", admin.username, e);
        AppError::BadRequest(e.to_string())
    })?;

    state.store.save_catalog(&catalog).await?;
    tracing::info!("📚 Admin '{}' updated the catalog ({} courses)", admin.username, catalog.len());

    Ok(Json(json!({
        "success": true,
        "message": "Course data updated successfully!",
        "courses": catalog,
    })))
}

pub async fn admin_page() -> Html<&'static str> {
    Html(ADMIN_PAGE)
}

const ADMIN_PAGE: &str = r###"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>🎓 UniAssist Admin</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f5f7fb;
            color: #1f2937;
        }
        header {
            background: #1e3a8a;
            color: white;
            padding: 1rem 2rem;
            display: flex;
            justify-content: space-between;
            align-items: center;
        }
        main { max-width: 1200px; margin: 2rem auto; padding: 0 1rem; }
        .card {
            background: white;
            border-radius: 12px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.06);
            padding: 1.5rem;
            margin-bottom: 1.5rem;
        }
        .login { max-width: 380px; margin: 6rem auto; }
        .login input, .range input {
            width: 100%;
            padding: 0.6rem;
            margin: 0.4rem 0 1rem;
            border: 1px solid #d1d5db;
            border-radius: 8px;
        }
        .range { display: flex; gap: 1rem; align-items: flex-end; flex-wrap: wrap; }
        .range label { flex: 1; min-width: 160px; }
        button {
            background: #2563eb;
            color: white;
            border: none;
            border-radius: 8px;
            padding: 0.6rem 1.2rem;
            cursor: pointer;
        }
        button.secondary { background: #64748b; }
        .tabs { display: flex; gap: 0.5rem; margin-bottom: 1.5rem; }
        .tabs button { background: #e2e8f0; color: #1f2937; }
        .tabs button.active { background: #2563eb; color: white; }
        .metrics { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 1rem; }
        .metric { background: #eff6ff; border-radius: 10px; padding: 1rem; }
        .metric .value { font-size: 1.8rem; font-weight: 700; color: #1e3a8a; }
        .metric .label { font-size: 0.85rem; color: #475569; }
        .charts { display: grid; grid-template-columns: 2fr 1fr; gap: 1.5rem; }
        .conversation { border-bottom: 1px solid #e5e7eb; padding: 0.8rem 0; }
        .conversation .meta { font-size: 0.8rem; color: #64748b; }
        textarea {
            width: 100%;
            min-height: 420px;
            font-family: 'SFMono-Regular', Consolas, monospace;
            font-size: 0.9rem;
            padding: 1rem;
            border: 1px solid #d1d5db;
            border-radius: 8px;
        }
        .message { margin: 0.8rem 0; padding: 0.8rem; border-radius: 8px; display: none; }
        .message.error { display: block; background: #fee2e2; color: #991b1b; }
        .message.ok { display: block; background: #dcfce7; color: #166534; }
        .hidden { display: none; }
    </style>
</head>
<body>
    <section id="loginView" class="card login">
        <h2>🔐 Admin Login</h2>
        <div id="loginMessage" class="message"></div>
        <label>Username<input id="username" autocomplete="username"></label>
        <label>Password<input id="password" type="password" autocomplete="current-password"></label>
        <button onclick="login()">Login</button>
    </section>

    <div id="dashboardView" class="hidden">
        <header>
            <h1>🎓 UniAssist Admin Dashboard</h1>
            <div><span id="whoami"></span> <button class="secondary" onclick="logout()">Logout</button></div>
        </header>
        <main>
            <div class="tabs">
                <button id="tab-analytics" class="active" onclick="showTab('analytics')">📊 User Analytics</button>
                <button id="tab-chats" onclick="showTab('chats')">💬 Chat History</button>
                <button id="tab-courses" onclick="showTab('courses')">📚 Manage Courses</button>
            </div>

            <section id="panel-analytics">
                <div class="card metrics" id="userMetrics"></div>
                <div class="charts">
                    <div class="card"><h3>Daily Active Users (last 7 days)</h3><canvas id="dauChart"></canvas></div>
                    <div class="card"><h3>Course Inquiries</h3><canvas id="inquiryChart"></canvas><p id="inquiryTotal"></p></div>
                </div>
            </section>

            <section id="panel-chats" class="hidden">
                <div class="card range">
                    <label>Start date<input type="date" id="startDate"></label>
                    <label>End date<input type="date" id="endDate"></label>
                    <button onclick="loadChats()">Apply</button>
                    <button class="secondary" onclick="exportChats()">📥 Export CSV</button>
                </div>
                <div class="card metrics" id="chatMetrics"></div>
                <div class="card"><h3>Recent Conversations</h3><div id="conversations"></div></div>
            </section>

            <section id="panel-courses" class="hidden">
                <div class="card">
                    <h3>Course Data (JSON)</h3>
                    <div id="courseMessage" class="message"></div>
                    <textarea id="courseEditor" spellcheck="false"></textarea>
                    <p style="margin-top: 1rem;"><button onclick="saveCourses()">💾 Save Changes</button></p>
                </div>
            </section>
        </main>
    </div>

    <script>
        const TOKEN_KEY = 'uniassist_admin_token';
        let dauChart = null;
        let inquiryChart = null;

        function token() { return sessionStorage.getItem(TOKEN_KEY); }

        async function api(path, options = {}) {
            const headers = Object.assign({}, options.headers || {}, { 'Authorization': 'Bearer ' + token() });
            const response = await fetch(path, Object.assign({}, options, { headers }));
            if (response.status === 401) {
                sessionStorage.removeItem(TOKEN_KEY);
                showLogin('Your session has expired. Please log in again.');
                throw new Error('unauthorized');
            }
            return response;
        }

        function showMessage(id, text, ok) {
            const el = document.getElementById(id);
            el.textContent = text;
            el.className = 'message ' + (ok ? 'ok' : 'error');
        }

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text == null ? '' : String(text);
            return div.innerHTML;
        }

        function showLogin(message) {
            document.getElementById('dashboardView').classList.add('hidden');
            document.getElementById('loginView').classList.remove('hidden');
            if (message) showMessage('loginMessage', message, false);
        }

        async function login() {
            const username = document.getElementById('username').value;
            const password = document.getElementById('password').value;
            const response = await fetch('/api/admin/login', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ username, password })
            });
            const data = await response.json();
            if (!data.success) {
                showMessage('loginMessage', data.message || 'Invalid credentials', false);
                return;
            }
            sessionStorage.setItem(TOKEN_KEY, data.token);
            document.getElementById('password').value = '';
            await openDashboard();
        }

        async function logout() {
            try { await api('/api/admin/logout', { method: 'POST' }); } catch (e) {}
            sessionStorage.removeItem(TOKEN_KEY);
            showLogin();
        }

        async function openDashboard() {
            const response = await api('/api/admin/verify');
            const data = await response.json();
            document.getElementById('whoami').textContent = '👤 ' + data.username;
            document.getElementById('loginView').classList.add('hidden');
            document.getElementById('dashboardView').classList.remove('hidden');
            await loadStats();
        }

        function showTab(name) {
            for (const tab of ['analytics', 'chats', 'courses']) {
                document.getElementById('panel-' + tab).classList.toggle('hidden', tab !== name);
                document.getElementById('tab-' + tab).classList.toggle('active', tab === name);
            }
            if (name === 'analytics') loadStats();
            if (name === 'chats') loadChats();
            if (name === 'courses') loadCourses();
        }

        function metric(value, label) {
            return '<div class="metric"><div class="value">' + escapeHtml(value) + '</div><div class="label">' + escapeHtml(label) + '</div></div>';
        }

        async function loadStats() {
            const data = await (await api('/api/admin/stats')).json();
            const s = data.user_stats;
            document.getElementById('userMetrics').innerHTML =
                metric(s.total_users, 'Total Users') +
                metric(s.active_today, 'Active Today') +
                metric(s.new_users_today, 'New Today') +
                metric(s.active_this_week, 'Active This Week') +
                metric(s.active_this_month, 'Active This Month') +
                metric(s.return_rate + '%', 'Return Rate');

            if (dauChart) dauChart.destroy();
            dauChart = new Chart(document.getElementById('dauChart'), {
                type: 'line',
                data: {
                    labels: s.daily_active_users.map(d => d.date),
                    datasets: [{ label: 'Active users', data: s.daily_active_users.map(d => d.count), borderColor: '#2563eb', tension: 0.3 }]
                },
                options: { scales: { y: { beginAtZero: true, ticks: { precision: 0 } } } }
            });

            const inquiries = data.course_inquiries;
            if (inquiryChart) inquiryChart.destroy();
            inquiryChart = new Chart(document.getElementById('inquiryChart'), {
                type: 'pie',
                data: { labels: inquiries.labels, datasets: [{ data: inquiries.values }] }
            });
            document.getElementById('inquiryTotal').textContent = 'Total inquiries: ' + inquiries.total_inquiries;
        }

        function rangeQuery() {
            const params = new URLSearchParams();
            const start = document.getElementById('startDate').value;
            const end = document.getElementById('endDate').value;
            if (start) params.set('start', start);
            if (end) params.set('end', end);
            return params.toString();
        }

        async function loadChats() {
            const response = await api('/api/admin/chats?' + rangeQuery());
            const data = await response.json();
            if (!data.success) {
                document.getElementById('conversations').textContent = data.message;
                return;
            }
            document.getElementById('startDate').value = data.start;
            document.getElementById('endDate').value = data.end;
            const m = data.metrics;
            document.getElementById('chatMetrics').innerHTML =
                metric(m.total_sessions, 'Active Days') +
                metric(m.total_messages, 'Total Messages') +
                metric(m.unique_chatters, 'Unique Users');
            document.getElementById('conversations').innerHTML = data.recent.length === 0
                ? '<p>No conversations in this range.</p>'
                : data.recent.map(c =>
                    '<div class="conversation"><div class="meta">' + escapeHtml(new Date(c.timestamp).toLocaleString()) +
                    (c.course_inquiry ? ' · ' + escapeHtml(c.course_inquiry) : '') + '</div>' +
                    '<p><strong>User:</strong> ' + escapeHtml(c.user_message) + '</p>' +
                    '<p><strong>Bot:</strong> ' + escapeHtml(c.bot_response) + '</p></div>'
                ).join('');
        }

        async function exportChats() {
            const response = await api('/api/admin/chats/export?' + rangeQuery());
            if (!response.ok) return;
            const blob = await response.blob();
            const link = document.createElement('a');
            link.href = URL.createObjectURL(blob);
            link.download = 'chat_history.csv';
            link.click();
            URL.revokeObjectURL(link.href);
        }

        async function loadCourses() {
            const data = await (await api('/api/admin/courses')).json();
            document.getElementById('courseEditor').value = data.editor_text;
        }

        async function saveCourses() {
            const response = await api('/api/admin/courses', {
                method: 'PUT',
                headers: { 'Content-Type': 'application/json' },
                body: document.getElementById('courseEditor').value
            });
            const data = await response.json();
            showMessage('courseMessage', data.message, data.success);
        }

        if (token()) {
            openDashboard().catch(() => showLogin());
        }
    </script>
</body>
</html>
"###;
