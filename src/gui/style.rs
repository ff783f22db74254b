use iced::{Background, Border, Shadow, Theme, Vector};
use iced::widget::button::{StyleSheet, Appearance};

/// A device row in the bluetooth list. Paired devices are tinted.
pub struct DeviceButtonStyleSheet {
    pub paired: bool,
}

impl StyleSheet for DeviceButtonStyleSheet {
    type Style = Theme;

    fn active(&self, style: &Self::Style) -> Appearance {
        let palette = style.extended_palette();
        let background = match self.paired {
            true => palette.success.weak.color,
            false => palette.background.weak.color,
        };

        Appearance {
            shadow_offset: Vector::default(),
            background: Some(Background::Color(background)),
            text_color: palette.background.base.text,
            border: Border {
                color: palette.background.strong.color,
                width: 1.0,
                radius: 4.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}
