//! Simple EQ editor
//!
//! Spectrum / response display on top, three columns of parameter sliders
//! underneath: low cut, peak, high cut.

mod spectrum_view;

use std::sync::Arc;

use nih_plug::params::Param;
use nih_plug::prelude::GuiContext;
use nih_plug_vizia::vizia::prelude::*;
use nih_plug_vizia::widgets::*;

use crate::spectrum::SpectrumReader;
use crate::EqParams;
use spectrum_view::SpectrumView;

#[cfg(feature = "debug")]
use std::time::Duration;

const STYLE: &str = include_str!("../ui.css");

#[derive(Lens, Clone)]
pub struct EqData {
    pub params: Arc<EqParams>,
}

impl Model for EqData {}

fn param_row<P>(
    cx: &mut Context,
    label: &'static str,
    map: impl Fn(&Arc<EqParams>) -> &P + Copy + 'static,
) where
    P: Param + 'static,
{
    VStack::new(cx, move |cx| {
        Label::new(cx, label).class("slider-label");
        ParamSlider::new(cx, EqData::params, move |p| map(p)).class("eq-slider");
    })
    .class("slider-container");
}

pub fn build_ui(
    cx: &mut Context,
    params: Arc<EqParams>,
    spectrum: SpectrumReader,
    _gui_context: Arc<dyn GuiContext>,
) {
    #[cfg(feature = "debug")]
    {
        crate::debug::ring::init();
        let timer = cx.add_timer(Duration::from_millis(250), None, |_, action| {
            if let TimerAction::Tick(_) = action {
                crate::debug::ring::drain_to_file();
            }
        });
        cx.start_timer(timer);
    }

    if let Err(e) = cx.add_stylesheet(STYLE) {
        log::warn!("failed to load stylesheet: {e:?}");
    }

    EqData {
        params: params.clone(),
    }
    .build(cx);

    VStack::new(cx, move |cx| {
        SpectrumView::new(cx, params.clone(), spectrum.clone()).class("response-area");

        HStack::new(cx, |cx| {
            VStack::new(cx, |cx| {
                Label::new(cx, "Low Cut").class("column-header");
                param_row(cx, "Frequency", |p| &p.low_cut_freq);
                param_row(cx, "Slope", |p| &p.low_cut_slope);
            })
            .class("eq-column");

            VStack::new(cx, |cx| {
                Label::new(cx, "Peak").class("column-header");
                param_row(cx, "Frequency", |p| &p.peak_freq);
                param_row(cx, "Gain", |p| &p.peak_gain);
                param_row(cx, "Quality", |p| &p.peak_quality);
            })
            .class("eq-column");

            VStack::new(cx, |cx| {
                Label::new(cx, "High Cut").class("column-header");
                param_row(cx, "Frequency", |p| &p.high_cut_freq);
                param_row(cx, "Slope", |p| &p.high_cut_slope);
            })
            .class("eq-column");
        })
        .class("controls");
    })
    .class("app-root");
}
