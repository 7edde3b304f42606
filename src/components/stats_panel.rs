use yew::prelude::*;

use crate::model::{BADGES, LevelStats, unlocked_badges};

#[derive(Properties, PartialEq, Clone)]
pub struct StatsPanelProps {
    pub stats: LevelStats,
    pub visited: usize,
}

#[function_component]
pub fn StatsPanel(props: &StatsPanelProps) -> Html {
    let row_style = "display:flex; align-items:center; gap:8px;";
    let label_style = "flex:1; font-weight:500;";
    let value_style = "min-width:60px; text-align:right; font-variant-numeric:tabular-nums; font-weight:600;";
    let stats = props.stats;
    let unlocked: Vec<&str> = unlocked_badges(props.visited).map(|b| b.name).collect();
    html! {
        <div style="position:absolute; top:12px; left:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:10px 14px; min-width:210px; display:flex; flex-direction:column; gap:8px; font-size:14px;">
            <div style={row_style}>
                <span style={format!("{} color:#58a6ff;", label_style)}>{ format!("Level {}", stats.level) }</span>
                <span style={format!("{} color:#8b949e;", value_style)}>{ format!("{}/{} XP", stats.current_xp, stats.next_level_xp) }</span>
            </div>
            <div style="height:6px; background:#30363d; border-radius:3px; overflow:hidden;">
                <div style={format!("height:100%; width:{:.1}%; background:#58a6ff;", stats.progress)}></div>
            </div>
            <div style={row_style}>
                <span style={label_style}>{"Erkundet"}</span>
                <span style={value_style}>{ props.visited }</span>
            </div>
            <div style="display:flex; gap:4px; flex-wrap:wrap;">
                { for BADGES.iter().map(|b| {
                    let style = if unlocked.contains(&b.name) { "opacity:1;" } else { "opacity:0.25; filter:grayscale(1);" };
                    html! { <span style={style} title={format!("{} ({} Punkte)", b.name, b.threshold)}>{ b.icon }</span> }
                }) }
            </div>
        </div>
    }
}
