//! The chat page served at `/`.

use streamchat_config::schema::PersonaConfig;

/// Escape text for use in HTML body and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the page with the persona's title, caption and input placeholder.
pub fn render_page(persona: &PersonaConfig) -> String {
    PAGE_TEMPLATE
        .replace("@@TITLE@@", &escape_html(&persona.title))
        .replace("@@CAPTION@@", &escape_html(&persona.caption))
        .replace("@@PLACEHOLDER@@", &escape_html(&persona.input_placeholder))
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>@@TITLE@@</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#fff;color:#262730;height:100vh;display:flex;flex-direction:column}
.header{max-width:760px;width:100%;margin:0 auto;padding:32px 20px 8px}
.header h1{font-size:28px;font-weight:700}
.header p{color:#808495;font-size:14px;margin-top:6px}
.messages{flex:1;overflow-y:auto;max-width:760px;width:100%;margin:0 auto;padding:12px 20px;display:flex;flex-direction:column;gap:12px}
.msg{display:flex;gap:12px;align-items:flex-start}
.avatar{width:32px;height:32px;border-radius:6px;flex-shrink:0;display:flex;align-items:center;justify-content:center;font-size:13px;font-weight:600;color:#fff}
.msg.user .avatar{background:#ff4b4b}
.msg.assistant .avatar{background:#ffa421}
.body{padding-top:6px;font-size:15px;line-height:1.6;white-space:pre-wrap;word-wrap:break-word}
.error{color:#c00;font-size:13px;align-self:center}
.input-bar{max-width:760px;width:100%;margin:0 auto;padding:16px 20px 28px}
.input-bar input{width:100%;padding:12px 16px;border:1px solid #d6d6d9;border-radius:8px;font-size:15px;outline:none;background:#f0f2f6}
.input-bar input:focus{border-color:#ff4b4b}
.input-bar input:disabled{opacity:.6}
</style>
</head>
<body>
<div class="header">
  <h1>@@TITLE@@</h1>
  <p>@@CAPTION@@</p>
</div>
<div class="messages" id="messages"></div>
<form class="input-bar" id="form">
  <input id="input" placeholder="@@PLACEHOLDER@@" autocomplete="off" autofocus>
</form>
<script>
const msgs=document.getElementById("messages");
const input=document.getElementById("input");
const CURSOR="▌";
let ws,pending=null,streaming=false;

function addTurn(role,text){
  const d=document.createElement("div");
  d.className="msg "+role;
  const a=document.createElement("div");
  a.className="avatar";
  a.textContent=role==="user"?"U":"A";
  const b=document.createElement("div");
  b.className="body";
  b.textContent=text;
  d.append(a,b);
  msgs.appendChild(d);
  msgs.scrollTop=msgs.scrollHeight;
  return b;
}

function addError(text){
  const d=document.createElement("div");
  d.className="error";
  d.textContent=text;
  msgs.appendChild(d);
  msgs.scrollTop=msgs.scrollHeight;
}

function render(turns){
  msgs.innerHTML="";
  for(const t of turns){if(t.role!=="system")addTurn(t.role,t.content)}
}

function finish(){
  pending=null;
  streaming=false;
  input.disabled=false;
  input.focus();
}

function connect(){
  const proto=location.protocol==="https:"?"wss:":"ws:";
  ws=new WebSocket(`${proto}//${location.host}/ws`);
  ws.onopen=()=>{
    const id=localStorage.getItem("streamchat_session");
    ws.send(JSON.stringify(id?{type:"hello",session_id:id}:{type:"hello"}));
  };
  ws.onclose=()=>{addError("Disconnected. Reload to reconnect.");input.disabled=true};
  ws.onmessage=(e)=>{
    const m=JSON.parse(e.data);
    switch(m.type){
      case "session_ready":localStorage.setItem("streamchat_session",m.session_id);break;
      case "transcript":pending=null;render(m.turns);break;
      case "partial":
        if(!pending)pending=addTurn("assistant","");
        pending.textContent=m.text+CURSOR;
        msgs.scrollTop=msgs.scrollHeight;
        break;
      case "complete":
        if(!pending)pending=addTurn("assistant","");
        pending.textContent=m.text;
        break;
      case "turn_committed":finish();break;
      case "error":
        if(pending&&pending.isConnected){pending.parentElement.remove()}
        addError(m.message);
        finish();
        break;
    }
  };
}

document.getElementById("form").addEventListener("submit",(e)=>{
  e.preventDefault();
  const text=input.value;
  if(!text.trim()||streaming||!ws||ws.readyState!==1)return;
  addTurn("user",text);
  ws.send(JSON.stringify({type:"submit",text}));
  input.value="";
  input.disabled=true;
  streaming=true;
});

connect();
</script>
</body>
</html>
"##;
