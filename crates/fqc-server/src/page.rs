use axum::response::Html;

/// The embedded viewer shell. All selection logic lives server-side in
/// the control graph; this page only renders snapshots and posts events.
pub fn viewer_page() -> Html<&'static str> {
    Html(VIEWER_PAGE)
}

const VIEWER_PAGE: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>fMRIPrep QC viewer</title>
    <style>
      body { margin: 0; font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, sans-serif; }
      header { display: flex; gap: 0.5rem; padding: 0.5rem; align-items: center; flex-wrap: wrap; }
      select { min-width: 14rem; }
      nav button { margin-right: 0.25rem; }
      nav button.active { font-weight: bold; text-decoration: underline; }
      object { width: 100%; min-height: 80vh; }
      #empty { padding: 2rem; color: #666; }
    </style>
  </head>
  <body>
    <header>
      <select id="subject"></select>
      <select id="session"></select>
      <nav id="steps"></nav>
    </header>
    <div id="empty" hidden>No figures found for this selection.</div>
    <object id="figure" type="image/svg+xml"></object>
    <script>
      const subject = document.getElementById("subject");
      const session = document.getElementById("session");
      const steps = document.getElementById("steps");
      const figure = document.getElementById("figure");
      const empty = document.getElementById("empty");

      function fill(select, options, selected) {
        select.replaceChildren(...options.map(opt => {
          const el = document.createElement("option");
          el.value = opt.value;
          el.textContent = opt.label;
          el.selected = opt.value === selected;
          return el;
        }));
      }

      function render(state) {
        fill(subject, state.subjects.map(s => ({ value: s, label: "sub-" + s })), state.subject);
        fill(session, state.session_options.map(s => ({ value: s.filename, label: s.label })),
             state.selected_session);
        steps.replaceChildren(...state.steps.map(choice => {
          const el = document.createElement("button");
          el.textContent = choice.title;
          el.className = choice.step === state.step ? "active" : "";
          el.onclick = () => send({ kind: "pick_step", step: choice.step });
          return el;
        }));
        empty.hidden = state.image_path !== null;
        figure.data = state.image_path ?? "";
      }

      async function send(event) {
        const response = await fetch("/api/event", {
          method: "POST",
          headers: { "Content-Type": "application/json" },
          body: JSON.stringify(event),
        });
        if (response.ok) {
          render(await response.json());
        }
      }

      subject.onchange = () => send({ kind: "pick_subject", subject: subject.value });
      session.onchange = () => send({ kind: "pick_session", filename: session.value });
      window.addEventListener("keydown", e => {
        if (e.target === subject || e.target === session) return;
        send({ kind: "key_down", key: e.key });
      });

      fetch("/api/state").then(r => r.json()).then(render);
    </script>
  </body>
</html>"##;
