//! Embedded viewer page, served when the static directory has no index.html

pub const VIEWER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Camera Wall</title>
<script src="https://cdn.jsdelivr.net/npm/hls.js@1"></script>
<style>
  body { background: #1a1a1a; color: #eee; font-family: sans-serif; margin: 0; padding: 16px; }
  header { display: flex; gap: 12px; align-items: center; margin-bottom: 12px; }
  .pagination button { margin: 2px; background: #333; color: #eee; border: 0; padding: 4px 10px; cursor: pointer; }
  .pagination button.active { background: #4a7; cursor: default; }
  #container { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 12px; }
  .camera-card { background: #2a2a2a; border-radius: 6px; overflow: hidden; }
  .camera-card.failed { background: #3a1a1a; }
  .camera-card video { width: 100%; aspect-ratio: 16 / 9; background: #000; }
  .camera-info { padding: 8px; font-size: 13px; }
  .camera-name { font-weight: bold; margin-bottom: 4px; }
  .status-indicator { display: inline-block; width: 8px; height: 8px; border-radius: 50%; background: #4a7; margin-right: 6px; }
  .status-indicator.offline { background: #c44; }
  .error { color: #e77; padding: 8px; }
</style>
</head>
<body>
<header>
  <label>Per page
    <select id="pageSize">
      <option>6</option><option selected>12</option><option>24</option><option>48</option>
    </select>
  </label>
  <div id="paginationTop" class="pagination"></div>
</header>
<div id="container"></div>
<div id="paginationBottom" class="pagination"></div>
<script>
const RETRY_ATTEMPTS = 3;
const RETRY_DELAY_MS = 1000;
const state = { page: 1, size: 12, cards: [] };
const $ = (id) => document.getElementById(id);

function debounce(fn, wait) {
  let timer;
  return (...args) => { clearTimeout(timer); timer = setTimeout(() => fn(...args), wait); };
}

async function loadWithRetry(hls, video, url, setStatus, alive) {
  for (let i = 0; i < RETRY_ATTEMPTS; i++) {
    hls.loadSource(url);
    hls.attachMedia(video);
    try {
      await new Promise((resolve, reject) => {
        hls.once(Hls.Events.MANIFEST_PARSED, resolve);
        hls.on(Hls.Events.ERROR, (_, data) => { if (data.fatal) reject(data); });
      });
      setStatus('Live');
      video.play().catch(() => setStatus('Playback Blocked', true));
      return;
    } catch (err) {
      if (!alive()) return;
      if (i < RETRY_ATTEMPTS - 1) {
        await new Promise((r) => setTimeout(r, RETRY_DELAY_MS * 2 ** i));
      } else {
        setStatus(`Stream Error: ${err.type || 'Unknown'}`, true);
      }
    }
  }
}

function createCard(camera) {
  const card = document.createElement('div');
  card.className = 'camera-card';
  const video = document.createElement('video');
  video.controls = true;
  video.muted = true;
  const info = document.createElement('div');
  info.className = 'camera-info';
  const name = document.createElement('div');
  name.className = 'camera-name';
  name.textContent = camera.name || 'Unnamed Camera';
  const meta = document.createElement('div');
  meta.textContent = `ID: ${camera.id_user} | Code: ${camera.devcode}`;
  const status = document.createElement('div');
  const dot = document.createElement('span');
  dot.className = 'status-indicator';
  const text = document.createElement('span');
  status.append(dot, text);
  info.append(name, meta, status);
  card.append(video, info);

  let alive = true;
  let hls = null;
  const setStatus = (message, isError = false) => {
    if (!alive) return;
    text.textContent = message;
    dot.className = 'status-indicator' + (isError ? ' offline' : '');
    card.classList.toggle('failed', isError);
  };
  setStatus('Connecting...');

  if (window.Hls && Hls.isSupported()) {
    hls = new Hls();
    loadWithRetry(hls, video, camera.stream_url, setStatus, () => alive);
  } else if (video.canPlayType('application/vnd.apple.mpegurl')) {
    video.src = camera.stream_url;
    video.addEventListener('loadeddata', () => setStatus('Live'));
    video.addEventListener('error', () => setStatus('Offline', true));
  } else {
    setStatus('Unsupported Format', true);
  }
  video.addEventListener('play', () => setStatus('Live'));
  video.addEventListener('waiting', () => setStatus('Buffering...'));

  const cleanup = () => {
    alive = false;
    if (hls) { hls.destroy(); hls = null; }
    video.pause();
    video.removeAttribute('src');
  };
  return { element: card, cleanup };
}

function renderButtons(buttons) {
  const html = buttons.map((b) =>
    `<button data-page="${b.number}"${b.active ? ' class="active" disabled' : ''}>${b.number}</button>`).join('');
  $('paginationTop').innerHTML = html;
  $('paginationBottom').innerHTML = html;
}

const render = debounce(async () => {
  state.cards.forEach((c) => c.cleanup());
  state.cards = [];
  const container = $('container');
  container.innerHTML = '';
  window.scrollTo(0, 0);
  try {
    const response = await fetch(`/api/page?page=${state.page}&size=${state.size}`);
    if (!response.ok) throw new Error(`HTTP ${response.status}`);
    const page = await response.json();
    page.cameras.forEach((camera) => {
      const card = createCard(camera);
      state.cards.push(card);
      container.appendChild(card.element);
    });
    page.rejected.forEach((record) => {
      const div = document.createElement('div');
      div.className = 'error';
      div.textContent = `Invalid camera data: ${JSON.stringify(record)}`;
      container.appendChild(div);
    });
    renderButtons(page.buttons);
  } catch (err) {
    const div = document.createElement('div');
    div.className = 'error';
    div.textContent = `Failed to load cameras: ${err.message}`;
    container.appendChild(div);
  }
}, 100);

$('pageSize').addEventListener('change', (e) => {
  state.size = parseInt(e.target.value, 10);
  state.page = 1;
  render();
});
['paginationTop', 'paginationBottom'].forEach((id) => {
  $(id).addEventListener('click', (e) => {
    if (e.target.tagName === 'BUTTON' && e.target.dataset.page) {
      state.page = parseInt(e.target.dataset.page, 10);
      render();
    }
  });
});
render();
</script>
</body>
</html>
"#;
