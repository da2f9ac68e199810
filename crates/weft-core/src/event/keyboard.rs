// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Key codes and modifier flags, numbered like the native layer reports them.

/// Key codes without a printable character are scancodes with bit 30 set.
const fn sc(code: i64) -> i64 {
    code | 1 << 30
}

crate::event_enum! {
    /// A key on the keyboard.
    ///
    /// Unknown codes marshal to [`Keys::ErrorKey`] with the raw code kept on the event.
    pub enum Keys {
        ErrorKey = -1,
        Backspace = 8,
        Tab = 9,
        Return = 13,
        Escape = 27,
        Space = 32,
        Exclaim = 33,
        Quotedbl = 34,
        Hash = 35,
        Dollar = 36,
        Ampersand = 38,
        Quote = 39,
        LeftParen = 40,
        RightParen = 41,
        Asterisk = 42,
        Plus = 43,
        Comma = 44,
        Minus = 45,
        Period = 46,
        Slash = 47,
        Zero = 48,
        One = 49,
        Two = 50,
        Three = 51,
        Four = 52,
        Five = 53,
        Six = 54,
        Seven = 55,
        Eight = 56,
        Nine = 57,
        Colon = 58,
        Semicolon = 59,
        Less = 60,
        Equals = 61,
        Greater = 62,
        Question = 63,
        At = 64,
        LeftBracket = 91,
        Backslash = 92,
        RightBracket = 93,
        Caret = 94,
        Underscore = 95,
        Backquote = 96,
        A = 97,
        B = 98,
        C = 99,
        D = 100,
        E = 101,
        F = 102,
        G = 103,
        H = 104,
        I = 105,
        J = 106,
        K = 107,
        L = 108,
        M = 109,
        N = 110,
        O = 111,
        P = 112,
        Q = 113,
        R = 114,
        S = 115,
        T = 116,
        U = 117,
        V = 118,
        W = 119,
        X = 120,
        Y = 121,
        Z = 122,
        Delete = 127,
        Capslock = sc(57),
        F1 = sc(58),
        F2 = sc(59),
        F3 = sc(60),
        F4 = sc(61),
        F5 = sc(62),
        F6 = sc(63),
        F7 = sc(64),
        F8 = sc(65),
        F9 = sc(66),
        F10 = sc(67),
        F11 = sc(68),
        F12 = sc(69),
        Print = sc(70),
        Scrollock = sc(71),
        Pause = sc(72),
        Insert = sc(73),
        Home = sc(74),
        PageUp = sc(75),
        End = sc(77),
        PageDown = sc(78),
        Right = sc(79),
        Left = sc(80),
        Down = sc(81),
        Up = sc(82),
        Numlock = sc(83),
        KPDivide = sc(84),
        KPMultiply = sc(85),
        KPMinus = sc(86),
        KPPlus = sc(87),
        KPEnter = sc(88),
        KP1 = sc(89),
        KP2 = sc(90),
        KP3 = sc(91),
        KP4 = sc(92),
        KP5 = sc(93),
        KP6 = sc(94),
        KP7 = sc(95),
        KP8 = sc(96),
        KP9 = sc(97),
        KP0 = sc(98),
        KPPeriod = sc(99),
        Power = sc(102),
        KPEquals = sc(103),
        F13 = sc(104),
        F14 = sc(105),
        F15 = sc(106),
        Help = sc(117),
        Menu = sc(118),
        SysReq = sc(154),
        Clear = sc(156),
        LCtrl = sc(224),
        LShift = sc(225),
        LAlt = sc(226),
        LSuper = sc(227),
        RCtrl = sc(228),
        RShift = sc(229),
        RAlt = sc(230),
        RSuper = sc(231),
        Mode = sc(257),
        AcBack = sc(270),
    }
    fallback = ErrorKey;
}

crate::event_flags! {
    /// The modifier keys held while a key event was generated.
    pub struct ModifierKeys {
        /// Left shift.
        const LSHIFT = 0x0001;
        /// Right shift.
        const RSHIFT = 0x0002;
        /// Either shift.
        const SHIFT = 0x0003;
        /// Left control.
        const LCTRL = 0x0040;
        /// Right control.
        const RCTRL = 0x0080;
        /// Either control.
        const CTRL = 0x00C0;
        /// Left alt.
        const LALT = 0x0100;
        /// Right alt.
        const RALT = 0x0200;
        /// Either alt.
        const ALT = 0x0300;
        /// Left meta (GUI) key.
        const LMETA = 0x0400;
        /// Right meta (GUI) key.
        const RMETA = 0x0800;
        /// Either meta key.
        const META = 0x0C00;
        /// Num lock.
        const NUM = 0x1000;
        /// Caps lock.
        const CAPS = 0x2000;
        /// AltGr.
        const MODE = 0x4000;
        /// Scroll lock.
        const SCROLL = 0x8000;
    }
}
