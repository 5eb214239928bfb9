use std::path::Path;
use crate::error::{EpgError, Result};

const STYLE: &str = r#"
<style>
h1 {
    font-size: 40px;
    color: #ffff;
    display: inline-block;
    backdrop-filter: blur(1px);
    border-radius: .4rem;
}
body{
    background: url(imgs/BG.jpg) center / cover;
    background-repeat: cover;
    background-size: contain;
    
   }
table{
    background-color: #fff5;
    backdrop-filter: blur(4px);
    box-shadow: 0.4rem .4rem #0005;
    border-radius: .8rem;
}
table th{
    font-size: 20px;
    background-color: #fff4;
    padding: .6rem 1rem;
    }
table tr.header,table tr:hover {
  background-color: #f1f1f1a6;
  
}
th.channel-id {
    text-align: center;
}
th.channel-title {
    text-align: left;
    }
th.des {
    text-align: left;
    }
th.rating {
    text-align: left;
    }
td.channel-id {
    text-align: center;
    }

img.channel-icon {
        display: flex;
        height: 50px;
        width: 50px;
        margin-right:.5rem;
        vertical-align: middle;
    }
td.channel-lg {
    display: flex;
    align-items: center;
    }

td.start-time {
    text-align:center;
    }
    
td.stop-time {
    text-align:center;
    }
td.channel-title {
    text-align: left;
    }
td.timezone {
    text-align: center;
    }
td.rating {
    text-align: left;
    padding-left: 50px;
    
    }
#ch_input {
  background-image: url('https://cdn3.iconfinder.com/data/icons/linecons-free-vector-icons-pack/32/search-512.png');
  background-position: 5px;
  background-repeat: no-repeat;
  background-size: 35px 35px;
  width: 19%; 
  font-size: 16px; 
  padding: 12px 20px 12px 50px; 
  border: 1px solid #ddd; 
  margin-bottom: 12px; 
  border-radius: .2rem;
    }
</style>
"#;

const FILTER_SCRIPT: &str = r#"<script>
 function func(){
 var input,filter,table,tr,td,i,txt;
 input = document.getElementById("ch_input");
 filter = input.value.toUpperCase();
 table = document.getElementById("ch_table");
 tr = table.getElementsByTagName("tr")

for( i=0; i<tr.length; i++){
   td = tr[i].getElementsByTagName("td")[0];
      if(td){
           txt = td.textContent || td.InnerText;
               if(txt.toUpperCase().indexOf(filter) > -1){
                   tr[i].style.display = "";
               }else{
                   tr[i].style.display ="none";
               }
           }
       }
for( i=0; i<tr.length; i++) {
   td = tr[i].getElementsByTagName("td")[1];
       if(td){
           txt=td.textContent || td.innerText;
           if(txt.toUpperCase().indexOf(filter) > -1){
               tr[i].style.display ="";
            }
        }
     }
  }
</script>"#;

const TITLE: &str = "<title> EPGdata</title>";
const HEADING: &str = "<h1>See below a table of the EPG data that has been obtained via the tuner</h1>\n<br></br>";
const SEARCH_INPUT: &str = "<input type=\"text\" id=\"ch_input\" onkeyup=\"func()\" placeholder=\"Search for a channel using the channel name/id ...\" title=\"search\"><br></br><br></br>";
const TABLE_HEAD: &str = "\n<table id=\"ch_table\">\n<tr><th class=\"channel-id\">Channel ID</th><th>Channel Logo and Name</th><th>Start Time</th><th>Stop Time</th><th>Time Zone</th><th class=\"channel-title\">Program Title</th><th class=\"rating\">Parental Rating</th><th class=\"des\">Program Description</th></tr>\n";

/// Wraps rendered rows into the complete page. Output depends only on `rows`.
pub fn render_page(rows: &[String]) -> String {
    let body_len: usize = rows.iter().map(String::len).sum();
    let mut s = String::with_capacity(STYLE.len() + FILTER_SCRIPT.len() + TABLE_HEAD.len() + body_len + 512);
    s.push_str("<!DOCTYPE html><html>\n<head>");
    s.push_str(STYLE);
    s.push_str("</head>\n<body>");
    s.push_str(TITLE);
    s.push_str(HEADING);
    s.push_str(SEARCH_INPUT);
    s.push_str(TABLE_HEAD);
    for r in rows { s.push_str(r); }
    s.push_str("</table>\n");
    s.push_str(FILTER_SCRIPT);
    s.push_str("</body>\n</html>");
    s
}

pub fn write_page(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html).map_err(|e| EpgError::WriteOutput { path: path.to_path_buf(), source: e })
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
