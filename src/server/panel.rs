//! Browser control panel served on `GET /`.

/// Control page: polls `/pot` once a second and issues `/move` via query
/// string.
pub const PANEL_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Stepper Control</title>
<script>
function updatePot() {
  fetch('/pot')
    .then(r => r.json())
    .then(d => { document.getElementById('pot').innerText = d.potentiometer ?? d.message; });
}
setInterval(updatePot, 1000);

function moveMotor(direction) {
  const steps = document.getElementById('steps').value;
  const speed = document.getElementById('speed').value;
  fetch(`/move?steps=${steps}&direction=${direction}&speed=${speed}`)
    .then(r => r.json())
    .then(d => { document.getElementById('last').innerText = JSON.stringify(d); });
}
</script>
</head>
<body>
<h1>Stepper Motor Control</h1>
<p>Potentiometer: <span id="pot">-</span></p>
<label for="steps">Steps:</label>
<input type="number" id="steps" min="0" value="200">
<label for="speed">Speed (Hz):</label>
<input type="number" id="speed" min="1" value="500">
<button onclick="moveMotor(1)">Forward</button>
<button onclick="moveMotor(0)">Backward</button>
<pre id="last"></pre>
</body>
</html>
"#;
