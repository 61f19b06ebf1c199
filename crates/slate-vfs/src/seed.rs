//! Starter project loaded into a fresh VFS.

pub(crate) const DEFAULT_PROJECT: &[(&str, &str)] = &[
    ("/index.html", INDEX_HTML),
    ("/style.css", STYLE_CSS),
    ("/script.js", SCRIPT_JS),
    ("/README.md", README_MD),
];

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>My Project</title>
  <link rel="stylesheet" href="style.css">
</head>
<body>
  <main class="container">
    <h1>Hello, world!</h1>
    <p>Edit <code>index.html</code>, <code>style.css</code> or <code>script.js</code> and watch the preview update.</p>
    <button id="greet">Click me</button>
    <p id="output"></p>
  </main>
  <script src="script.js"></script>
</body>
</html>
"#;

const STYLE_CSS: &str = r#"* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, sans-serif;
  background: #f5f5f7;
  color: #1d1d1f;
}

.container {
  max-width: 640px;
  margin: 4rem auto;
  padding: 2rem;
  background: #fff;
  border-radius: 12px;
  box-shadow: 0 4px 24px rgba(0, 0, 0, 0.08);
}

button {
  padding: 0.5rem 1rem;
  border: none;
  border-radius: 6px;
  background: #0071e3;
  color: #fff;
  cursor: pointer;
}
"#;

const SCRIPT_JS: &str = r#"const button = document.getElementById('greet');
const output = document.getElementById('output');
let clicks = 0;

button.addEventListener('click', () => {
  clicks += 1;
  output.textContent = `Clicked ${clicks} time${clicks === 1 ? '' : 's'}.`;
});
"#;

const README_MD: &str = r#"# My Project

A starter HTML, CSS and JavaScript project.

- `index.html` is the entry document shown in the preview.
- `style.css` holds the page styles.
- `script.js` wires up the button.
"#;
